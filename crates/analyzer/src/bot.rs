//! Well-known bot signature matching against the `User-Agent` header.

use crate::{BotDetectionConfig, BotSignals};

/// A small static table of identifiers this analyzer recognizes in a
/// `User-Agent` string, each mapped to a well-known bot identifier used
/// in `allow`/`deny` lists.
#[derive(Debug, Clone)]
pub struct BotCatalog {
    signatures: Vec<(&'static str, &'static str)>, // (needle, identifier)
}

impl Default for BotCatalog {
    fn default() -> Self {
        Self::well_known()
    }
}

impl BotCatalog {
    pub fn well_known() -> Self {
        Self {
            signatures: vec![
                ("curl/", "CURL"),
                ("wget/", "WGET"),
                ("googlebot", "GOOGLEBOT"),
                ("bingbot", "BINGBOT"),
                ("python-requests", "PYTHON_REQUESTS"),
                ("postmanruntime", "POSTMAN"),
                ("headlesschrome", "HEADLESS_CHROME"),
                ("phantomjs", "PHANTOMJS"),
                ("ahrefsbot", "AHREFSBOT"),
                ("semrushbot", "SEMRUSHBOT"),
            ],
        }
    }

    /// Identify the bot signature (if any) in a `User-Agent` string.
    pub fn identify(&self, user_agent: &str) -> Option<&'static str> {
        let lowered = user_agent.to_ascii_lowercase();
        self.signatures
            .iter()
            .find(|(needle, _)| lowered.contains(needle))
            .map(|(_, id)| *id)
    }
}

/// `*` in an allow/deny list matches every identified bot.
fn matches(list: &[String], identifier: &str) -> bool {
    list.iter().any(|entry| entry == "*" || entry == identifier)
}

pub(crate) fn detect(
    catalog: &BotCatalog,
    user_agent: Option<&str>,
    config: &BotDetectionConfig,
) -> BotSignals {
    let Some(identifier) = user_agent.and_then(|ua| catalog.identify(ua)) else {
        return BotSignals::default();
    };

    if let Some(deny) = &config.deny {
        if matches(deny, identifier) {
            return BotSignals {
                allowed: vec![],
                denied: vec![identifier.to_string()],
            };
        }
        return BotSignals::default();
    }

    if let Some(allow) = &config.allow {
        if matches(allow, identifier) {
            return BotSignals {
                allowed: vec![identifier.to_string()],
                denied: vec![],
            };
        }
        return BotSignals {
            allowed: vec![],
            denied: vec![identifier.to_string()],
        };
    }

    BotSignals::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifies_curl() {
        let catalog = BotCatalog::well_known();
        assert_eq!(catalog.identify("curl/8.0"), Some("CURL"));
    }

    #[test]
    fn deny_list_denies_matching_identifier() {
        let catalog = BotCatalog::well_known();
        let config = BotDetectionConfig {
            allow: None,
            deny: Some(vec!["CURL".to_string()]),
        };
        let signals = detect(&catalog, Some("curl/8.0"), &config);
        assert_eq!(signals.denied, vec!["CURL".to_string()]);
        assert!(signals.allowed.is_empty());
    }

    #[test]
    fn allow_list_denies_unlisted_identifier() {
        let catalog = BotCatalog::well_known();
        let config = BotDetectionConfig {
            allow: Some(vec!["GOOGLEBOT".to_string()]),
            deny: None,
        };
        let signals = detect(&catalog, Some("curl/8.0"), &config);
        assert_eq!(signals.denied, vec!["CURL".to_string()]);
    }

    #[test]
    fn unknown_user_agent_has_no_signal() {
        let catalog = BotCatalog::well_known();
        let config = BotDetectionConfig::default();
        let signals = detect(&catalog, Some("Mozilla/5.0 (normal browser)"), &config);
        assert_eq!(signals, BotSignals::default());
    }

    #[test]
    fn wildcard_matches_any_identifier() {
        let catalog = BotCatalog::well_known();
        let config = BotDetectionConfig {
            allow: None,
            deny: Some(vec!["*".to_string()]),
        };
        let signals = detect(&catalog, Some("googlebot/2.1"), &config);
        assert_eq!(signals.denied, vec!["GOOGLEBOT".to_string()]);
    }
}
