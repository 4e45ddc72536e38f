//! Tagged value objects describing a rule's outcome and the engine's
//! overall verdict (spec.md §3, component G).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the four outcomes a rule or the engine can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Conclusion {
    Allow,
    Deny,
    Challenge,
    Error,
}

/// Lifecycle state of a single rule's invocation within one `protect` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleState {
    /// The rule was not evaluated at all (remote-only rule, or evaluation
    /// short-circuited before it was reached).
    NotRun,
    /// The rule ran to completion (including the ERROR outcome).
    Run,
    /// The decision came from the block cache, not a live rule run.
    Cached,
}

/// Disqualifying reasons `isValidEmail` may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailReason {
    Invalid,
    Disposable,
    Free,
    NoMxRecords,
    NoGravatar,
}

/// Entity kinds the sensitive-info detector recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Email,
    PhoneNumber,
    CreditCardNumber,
    IpAddress,
}

/// The structured evidence behind a [`Conclusion`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Reason {
    RateLimit {
        max: u32,
        remaining: u32,
        reset_seconds: u32,
    },
    Bot {
        allowed: Vec<String>,
        denied: Vec<String>,
    },
    Email {
        email_types: Vec<EmailReason>,
    },
    SensitiveInfo {
        allowed: Vec<EntityKind>,
        denied: Vec<EntityKind>,
    },
    Shield {
        rule_id: String,
    },
    Error {
        message: String,
    },
    #[serde(rename = "generic")]
    Generic,
}

impl Default for Reason {
    fn default() -> Self {
        Reason::Generic
    }
}

/// One rule's contribution to a `protect` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule_id: String,
    pub ttl: u32,
    pub state: RuleState,
    pub conclusion: Conclusion,
    pub reason: Reason,
}

impl RuleResult {
    /// The default entry the engine seeds `results` with before any rule
    /// has run (spec.md §4.H step 5).
    pub fn not_run(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            ttl: 0,
            state: RuleState::NotRun,
            conclusion: Conclusion::Allow,
            reason: Reason::Generic,
        }
    }
}

/// The engine's final verdict for one `protect` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub conclusion: Conclusion,
    pub ttl: u32,
    pub reason: Reason,
    pub results: Vec<RuleResult>,
}

impl Decision {
    fn new(conclusion: Conclusion, ttl: u32, reason: Reason, results: Vec<RuleResult>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conclusion,
            ttl,
            reason,
            results,
        }
    }

    pub fn allow(reason: Reason, results: Vec<RuleResult>) -> Self {
        Self::new(Conclusion::Allow, 0, reason, results)
    }

    pub fn deny(ttl: u32, reason: Reason, results: Vec<RuleResult>) -> Self {
        Self::new(Conclusion::Deny, ttl, reason, results)
    }

    pub fn challenge(reason: Reason, results: Vec<RuleResult>) -> Self {
        Self::new(Conclusion::Challenge, 0, reason, results)
    }

    pub fn error(message: impl Into<String>, results: Vec<RuleResult>) -> Self {
        Self::new(
            Conclusion::Error,
            0,
            Reason::Error {
                message: message.into(),
            },
            results,
        )
    }

    pub fn is_denied(&self) -> bool {
        self.conclusion == Conclusion::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_decision_carries_ttl_and_reason() {
        let d = Decision::deny(
            60,
            Reason::Bot {
                allowed: vec![],
                denied: vec!["CURL".to_string()],
            },
            vec![],
        );
        assert!(d.is_denied());
        assert_eq!(d.ttl, 60);
    }

    #[test]
    fn error_decision_preserves_results() {
        let results = vec![RuleResult::not_run("rule-1")];
        let d = Decision::error("boom", results.clone());
        assert_eq!(d.conclusion, Conclusion::Error);
        assert_eq!(d.results, results);
    }

    #[test]
    fn reason_serializes_with_type_tag() {
        let r = Reason::Shield {
            rule_id: "rule-2".to_string(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["type"], "shield");
        assert_eq!(json["ruleId"], "rule-2");
    }
}
