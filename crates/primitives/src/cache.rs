//! Process-local fingerprint -> block-reason cache with lazy eviction
//! (spec.md §4.C). No background sweep: an expired entry is only ever
//! removed the next time it is looked up via [`BlockCache::get`].

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

use crate::decision::Reason;

fn now_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[derive(Debug, Default)]
pub struct BlockCache {
    entries: RwLock<HashMap<String, (Reason, u64)>>,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached block reason if its expiry is strictly in the
    /// future; otherwise lazily evicts the (possibly absent) entry and
    /// returns `None`.
    pub fn get(&self, key: &str) -> Option<Reason> {
        let now = now_epoch_seconds();
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some((reason, expires_at)) if *expires_at > now => Some(reason.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Overwrite (or insert) the block for `key`, expiring at the given
    /// absolute epoch-seconds timestamp.
    pub fn set(&self, key: impl Into<String>, reason: Reason, expires_at: u64) {
        self.entries.write().insert(key.into(), (reason, expires_at));
    }

    /// Seconds remaining until expiry, without evicting. Never negative.
    pub fn ttl(&self, key: &str) -> u32 {
        let now = now_epoch_seconds();
        let entries = self.entries.read();
        match entries.get(key) {
            Some((_, expires_at)) => expires_at.saturating_sub(now).min(u32::MAX as u64) as u32,
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_entry_is_returned() {
        let cache = BlockCache::new();
        cache.set("fp-1", Reason::Generic, now_epoch_seconds() + 60);
        assert_eq!(cache.get("fp-1"), Some(Reason::Generic));
        assert!(cache.ttl("fp-1") > 0);
    }

    #[test]
    fn expired_entry_is_lazily_evicted() {
        let cache = BlockCache::new();
        cache.set("fp-1", Reason::Generic, now_epoch_seconds().saturating_sub(1));
        assert_eq!(cache.get("fp-1"), None);
        // A second get sees a clean miss, not a stale hit.
        assert_eq!(cache.get("fp-1"), None);
    }

    #[test]
    fn ttl_of_missing_key_is_zero() {
        let cache = BlockCache::new();
        assert_eq!(cache.ttl("missing"), 0);
    }

    #[test]
    fn get_is_idempotent_without_interleaved_set() {
        let cache = BlockCache::new();
        cache.set("fp-1", Reason::Generic, now_epoch_seconds() + 60);
        assert_eq!(cache.get("fp-1"), cache.get("fp-1"));
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let cache = BlockCache::new();
        cache.set("fp-1", Reason::Generic, now_epoch_seconds() + 60);
        cache.set(
            "fp-1",
            Reason::Shield {
                rule_id: "rule-1".to_string(),
            },
            now_epoch_seconds() + 10,
        );
        assert_eq!(
            cache.get("fp-1"),
            Some(Reason::Shield {
                rule_id: "rule-1".to_string()
            })
        );
    }
}
