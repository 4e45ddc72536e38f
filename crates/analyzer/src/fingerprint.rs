//! Deterministic SHA-256 fingerprint over `(key, ip, characteristics)`.
//! The IP is always folded in, independent of `characteristics`, so that
//! distinct clients of the same site never collapse onto one fingerprint
//! (Glossary: "Fingerprint — stable hash of a request's identity
//! features (IP plus configured characteristics)").

use sha2::{Digest, Sha256};

use crate::Projection;

pub(crate) fn generate(projection: &Projection) -> String {
    let mut hasher = Sha256::new();
    hasher.update(projection.key.as_bytes());
    hasher.update(b"\0ip=");
    hasher.update(projection.ip.as_deref().unwrap_or("").as_bytes());
    for (name, value) in &projection.characteristics {
        hasher.update(b"\0");
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection(key: &str, ip: Option<&str>, pairs: &[(&str, &str)]) -> Projection {
        Projection {
            key: key.to_string(),
            ip: ip.map(str::to_string),
            characteristics: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn deterministic_for_same_input() {
        let p = projection("site-1", Some("1.2.3.4"), &[]);
        assert_eq!(generate(&p), generate(&p));
    }

    #[test]
    fn differs_when_ip_differs_even_with_identical_characteristics() {
        let a = projection("site-1", Some("1.2.3.4"), &[("plan", "pro")]);
        let b = projection("site-1", Some("5.6.7.8"), &[("plan", "pro")]);
        assert_ne!(generate(&a), generate(&b));
    }

    #[test]
    fn differs_when_ip_differs_with_no_characteristics_configured() {
        // The common/default configuration: characteristics is empty, so
        // the IP is the only thing distinguishing two clients of the
        // same site.
        let a = projection("site-1", Some("1.2.3.4"), &[]);
        let b = projection("site-1", Some("5.6.7.8"), &[]);
        assert_ne!(generate(&a), generate(&b));
    }

    #[test]
    fn differs_when_characteristics_differ() {
        let a = projection("site-1", Some("1.2.3.4"), &[("ip.src", "1.2.3.4")]);
        let b = projection("site-1", Some("1.2.3.4"), &[("ip.src", "5.6.7.8")]);
        assert_ne!(generate(&a), generate(&b));
    }

    #[test]
    fn differs_when_order_differs() {
        let a = projection("site-1", None, &[("a", "1"), ("b", "2")]);
        let b = projection("site-1", None, &[("b", "2"), ("a", "1")]);
        assert_ne!(generate(&a), generate(&b));
    }
}
