//! The Analyzer interface (spec.md §4.E): stateless, side-effect-free
//! analysis primitives invoked by the engine and by local rules, plus a
//! concrete `LocalAnalyzer` reference implementation.
//!
//! These operations are explicitly *local* per the spec ("Local,
//! side-effect-free analysis primitives") rather than remote calls, so a
//! real in-process implementation belongs here, not just a test double.

mod bot;
mod email;
mod fingerprint;
mod sensitive_info;

pub use bot::BotCatalog;

use async_trait::async_trait;
use portcullis_primitives::{EmailReason, EntityKind};
use std::collections::HashSet;
use std::sync::Arc;

/// A flattened, read-only projection of `(key, characteristics, request)`
/// sufficient for side-effect-free local analysis. The engine is
/// responsible for resolving each configured characteristic name (well
/// known or user-defined) to a value before calling into the analyzer.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub key: String,
    /// Source IP of the request. Always folded into the fingerprint,
    /// independent of whether `"ip.src"` also appears in
    /// `characteristics` (Glossary: "Fingerprint — stable hash of a
    /// request's identity features (IP plus configured
    /// characteristics)").
    pub ip: Option<String>,
    /// Characteristic name -> resolved value, in configured order.
    pub characteristics: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotSignals {
    pub allowed: Vec<String>,
    pub denied: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BotDetectionConfig {
    pub allow: Option<Vec<String>>,
    pub deny: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailValidity {
    Valid,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCheck {
    pub validity: EmailValidity,
    pub blocked: Vec<EmailReason>,
}

#[derive(Debug, Clone)]
pub struct EmailValidationOptions {
    pub block: HashSet<EmailReason>,
    pub require_top_level_domain: bool,
    pub allow_domain_literal: bool,
}

impl Default for EmailValidationOptions {
    fn default() -> Self {
        Self {
            block: HashSet::new(),
            require_top_level_domain: true,
            allow_domain_literal: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensitiveInfoResult {
    pub allowed: Vec<EntityKind>,
    pub denied: Vec<EntityKind>,
}

/// Caller-supplied override for sensitive-info detection; receives the
/// context window around a candidate match and returns the entity kinds
/// it represents (empty if the caller decides it isn't sensitive).
pub type CustomDetectFn = Arc<dyn Fn(&str) -> Vec<EntityKind> + Send + Sync>;

#[derive(Clone)]
pub struct SensitiveInfoQuery {
    pub allow: Option<Vec<EntityKind>>,
    pub deny: Option<Vec<EntityKind>>,
    pub context_window_size: u32,
    pub custom_detect: Option<CustomDetectFn>,
}

impl std::fmt::Debug for SensitiveInfoQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensitiveInfoQuery")
            .field("allow", &self.allow)
            .field("deny", &self.deny)
            .field("context_window_size", &self.context_window_size)
            .field("custom_detect", &self.custom_detect.is_some())
            .finish()
    }
}

/// Stateless, side-effect-free analysis primitives (spec.md §4.E).
/// Implementations are expected to be pure and fast; the engine does not
/// retry them and treats failures as local-rule ERRORs.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn generate_fingerprint(&self, projection: &Projection) -> String;

    async fn detect_bot(&self, user_agent: Option<&str>, config: &BotDetectionConfig) -> BotSignals;

    async fn is_valid_email(&self, email: &str, opts: &EmailValidationOptions) -> EmailCheck;

    async fn detect_sensitive_info(&self, body: &str, query: &SensitiveInfoQuery) -> SensitiveInfoResult;
}

/// Default in-process analyzer: SHA-256 fingerprinting, a static
/// well-known-bot signature table, syntax/domain-shape email validation,
/// and regex-based sensitive-info detection. No network or disk I/O.
#[derive(Debug, Default)]
pub struct LocalAnalyzer {
    bots: BotCatalog,
}

impl LocalAnalyzer {
    pub fn new() -> Self {
        Self {
            bots: BotCatalog::well_known(),
        }
    }
}

#[async_trait]
impl Analyzer for LocalAnalyzer {
    async fn generate_fingerprint(&self, projection: &Projection) -> String {
        fingerprint::generate(projection)
    }

    async fn detect_bot(&self, user_agent: Option<&str>, config: &BotDetectionConfig) -> BotSignals {
        bot::detect(&self.bots, user_agent, config)
    }

    async fn is_valid_email(&self, email: &str, opts: &EmailValidationOptions) -> EmailCheck {
        email::validate(email, opts)
    }

    async fn detect_sensitive_info(&self, body: &str, query: &SensitiveInfoQuery) -> SensitiveInfoResult {
        sensitive_info::detect(body, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_analyzer_drives_fingerprint_and_bot_detection_through_the_trait() {
        let analyzer = LocalAnalyzer::new();

        let fp_a = analyzer
            .generate_fingerprint(&Projection {
                key: "site".to_string(),
                ip: Some("1.2.3.4".to_string()),
                characteristics: vec![],
            })
            .await;
        let fp_b = analyzer
            .generate_fingerprint(&Projection {
                key: "site".to_string(),
                ip: Some("5.6.7.8".to_string()),
                characteristics: vec![],
            })
            .await;
        assert_ne!(fp_a, fp_b);

        let signals = analyzer
            .detect_bot(
                Some("curl/8.0"),
                &BotDetectionConfig {
                    allow: None,
                    deny: Some(vec!["CURL".to_string()]),
                },
            )
            .await;
        assert_eq!(signals.denied, vec!["CURL".to_string()]);
    }
}
