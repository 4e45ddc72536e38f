//! SENSITIVE_INFO rule construction and local evaluation (spec.md §4.D, §4.H).

use async_trait::async_trait;
use portcullis_analyzer::{Analyzer, CustomDetectFn, SensitiveInfoQuery};
use portcullis_primitives::{EntityKind, Reason};

use crate::{ConstructionError, LocalRule, LocalRuleContext, Mode, Rule, RuleError, RuleKind, RuleOutcome};

const DEFAULT_CONTEXT_WINDOW_SIZE: u32 = 1;
const SENSITIVE_INFO_DENY_TTL_SECONDS: u32 = 300;

#[derive(Clone)]
pub struct SensitiveInfoRule {
    pub allow: Option<Vec<EntityKind>>,
    pub deny: Option<Vec<EntityKind>>,
    pub context_window_size: u32,
    pub custom_detect: Option<CustomDetectFn>,
}

impl Default for SensitiveInfoRule {
    fn default() -> Self {
        Self {
            allow: None,
            deny: None,
            context_window_size: DEFAULT_CONTEXT_WINDOW_SIZE,
            custom_detect: None,
        }
    }
}

impl std::fmt::Debug for SensitiveInfoRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensitiveInfoRule")
            .field("allow", &self.allow)
            .field("deny", &self.deny)
            .field("context_window_size", &self.context_window_size)
            .field("custom_detect", &self.custom_detect.is_some())
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct SensitiveInfoOptions {
    pub allow: Option<Vec<EntityKind>>,
    pub deny: Option<Vec<EntityKind>>,
    pub context_window_size: Option<u32>,
    pub custom_detect: Option<CustomDetectFn>,
    pub mode: Option<String>,
}

/// `sensitiveInfo` always emits at least one rule, even with no options.
pub fn sensitive_info(options: Vec<SensitiveInfoOptions>) -> Result<Vec<Rule>, ConstructionError> {
    if options.is_empty() {
        return Ok(vec![Rule::new(
            RuleKind::SensitiveInfo(SensitiveInfoRule::default()),
            Mode::DryRun,
        )]);
    }
    options
        .into_iter()
        .map(|opts| {
            if opts.allow.is_some() && opts.deny.is_some() {
                return Err(ConstructionError::MutuallyExclusiveAllowDeny {
                    kind: "SENSITIVE_INFO",
                });
            }
            Ok(Rule::new(
                RuleKind::SensitiveInfo(SensitiveInfoRule {
                    allow: opts.allow,
                    deny: opts.deny,
                    context_window_size: opts
                        .context_window_size
                        .unwrap_or(DEFAULT_CONTEXT_WINDOW_SIZE),
                    custom_detect: opts.custom_detect,
                }),
                Mode::from_option_str(opts.mode.as_deref()),
            ))
        })
        .collect()
}

#[async_trait]
impl LocalRule for SensitiveInfoRule {
    async fn validate(&self, ctx: LocalRuleContext<'_>) -> Result<(), RuleError> {
        // Unlike BOT's absent user-agent, a missing body is treated as an
        // error rather than "nothing to scan" (spec.md §9's body-access note).
        if ctx.body.is_none() {
            return Err(RuleError::MissingField("body"));
        }
        Ok(())
    }

    async fn protect(
        &self,
        analyzer: &dyn Analyzer,
        ctx: LocalRuleContext<'_>,
    ) -> Result<RuleOutcome, RuleError> {
        let body = ctx.body.ok_or(RuleError::MissingField("body"))?;
        let query = SensitiveInfoQuery {
            allow: self.allow.clone(),
            deny: self.deny.clone(),
            context_window_size: self.context_window_size,
            custom_detect: self.custom_detect.clone(),
        };
        let result = analyzer.detect_sensitive_info(body, &query).await;

        if result.denied.is_empty() {
            return Ok(RuleOutcome::allow(Reason::SensitiveInfo {
                allowed: result.allowed,
                denied: result.denied,
            }));
        }
        Ok(RuleOutcome::deny(
            Reason::SensitiveInfo {
                allowed: result.allowed,
                denied: result.denied,
            },
            SENSITIVE_INFO_DENY_TTL_SECONDS,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_options_emits_one_default_rule() {
        let rules = sensitive_info(vec![]).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].priority, 1);
    }

    #[test]
    fn allow_and_deny_together_is_a_construction_error() {
        let err = sensitive_info(vec![SensitiveInfoOptions {
            allow: Some(vec![EntityKind::Email]),
            deny: Some(vec![EntityKind::IpAddress]),
            ..Default::default()
        }])
        .unwrap_err();
        assert!(matches!(
            err,
            ConstructionError::MutuallyExclusiveAllowDeny {
                kind: "SENSITIVE_INFO"
            }
        ));
    }

    #[test]
    fn default_context_window_size_is_one() {
        let rules = sensitive_info(vec![SensitiveInfoOptions::default()]).unwrap();
        let RuleKind::SensitiveInfo(rule) = &rules[0].kind else {
            panic!("expected SensitiveInfo rule");
        };
        assert_eq!(rule.context_window_size, 1);
    }

    #[tokio::test]
    async fn missing_body_is_a_validation_error() {
        let rule = SensitiveInfoRule::default();
        let ctx = LocalRuleContext::default();
        let err = rule.validate(ctx).await.unwrap_err();
        assert!(matches!(err, RuleError::MissingField("body")));
    }

    #[tokio::test]
    async fn protect_denies_when_a_default_rule_finds_an_email() {
        let analyzer = portcullis_analyzer::LocalAnalyzer::new();
        let rule = SensitiveInfoRule::default();
        let ctx = LocalRuleContext {
            body: Some("reach me at person@example.com"),
            ..Default::default()
        };
        rule.validate(ctx).await.unwrap();
        let outcome = rule.protect(&analyzer, ctx).await.unwrap();
        assert_eq!(outcome.conclusion, portcullis_primitives::Conclusion::Deny);
    }
}
