//! Case-insensitive, multi-valued header container with deterministic,
//! insertion-order iteration.

use std::collections::HashMap;

/// Ordered, case-insensitive header map. Multiple values for the same
/// name are preserved as separate entries in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    // (lowercased name, value), insertion order preserved.
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single name/value pair. `undefined`/missing values must be
    /// filtered out by the caller before reaching this method (see
    /// [`HeaderMap::from_optional_pairs`] for the convenience that does so).
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .push((name.as_ref().to_ascii_lowercase(), value.into()));
    }

    pub fn has(&self, name: &str) -> bool {
        let needle = name.to_ascii_lowercase();
        self.entries.iter().any(|(k, _)| *k == needle)
    }

    /// First value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        let needle = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == needle)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Every (lowercased name, value) pair in insertion order. A header
    /// with N values appears as N entries, one per value.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Flatten to a name -> first-value mapping, as used when normalizing
    /// a request for fingerprinting (spec.md §4.E).
    pub fn flatten_first(&self) -> HashMap<String, String> {
        let mut out = HashMap::new();
        for (k, v) in &self.entries {
            out.entry(k.clone()).or_insert_with(|| v.clone());
        }
        out
    }

    /// Build from an iterator of (name, optional value) pairs; `None`
    /// values are skipped, matching the spec's "undefined is skipped"
    /// construction rule.
    pub fn from_optional_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (k, v) in pairs {
            if let Some(v) = v {
                map.insert(k, v);
            }
        }
        map
    }

    /// Build from a name -> multiple-values mapping.
    pub fn from_multi_map(map: HashMap<String, Vec<String>>) -> Self {
        let mut out = Self::new();
        for (k, values) in map {
            for v in values {
                out.insert(&k, v);
            }
        }
        out
    }
}

impl From<HashMap<String, String>> for HeaderMap {
    fn from(map: HashMap<String, String>) -> Self {
        let mut out = Self::new();
        for (k, v) in map {
            out.insert(k, v);
        }
        out
    }
}

impl FromIterator<(String, String)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}
