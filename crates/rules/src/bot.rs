//! BOT rule construction and local evaluation (spec.md §4.D, §4.H).

use async_trait::async_trait;
use portcullis_analyzer::{Analyzer, BotDetectionConfig};
use portcullis_primitives::Reason;

use crate::{ConstructionError, LocalRule, LocalRuleContext, Mode, Rule, RuleError, RuleKind, RuleOutcome};

/// Cache TTL applied when a BOT rule denies in LIVE mode.
const BOT_DENY_TTL_SECONDS: u32 = 60;

#[derive(Debug, Clone, Default)]
pub struct BotRule {
    pub allow: Option<Vec<String>>,
    pub deny: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct BotOptions {
    pub allow: Option<Vec<String>>,
    pub deny: Option<Vec<String>>,
    pub mode: Option<String>,
}

/// `detectBot` always emits at least one rule, even with no options
/// (spec.md §4.D's asymmetry note).
pub fn detect_bot(options: Vec<BotOptions>) -> Result<Vec<Rule>, ConstructionError> {
    if options.is_empty() {
        return Ok(vec![Rule::new(
            RuleKind::Bot(BotRule::default()),
            Mode::DryRun,
        )]);
    }
    options
        .into_iter()
        .map(|opts| {
            if opts.allow.is_some() && opts.deny.is_some() {
                return Err(ConstructionError::MutuallyExclusiveAllowDeny { kind: "BOT" });
            }
            Ok(Rule::new(
                RuleKind::Bot(BotRule {
                    allow: opts.allow,
                    deny: opts.deny,
                }),
                Mode::from_option_str(opts.mode.as_deref()),
            ))
        })
        .collect()
}

#[async_trait]
impl LocalRule for BotRule {
    async fn validate(&self, _ctx: LocalRuleContext<'_>) -> Result<(), RuleError> {
        // Absence of a User-Agent is not an error — it simply identifies
        // no known bot.
        Ok(())
    }

    async fn protect(
        &self,
        analyzer: &dyn Analyzer,
        ctx: LocalRuleContext<'_>,
    ) -> Result<RuleOutcome, RuleError> {
        let config = BotDetectionConfig {
            allow: self.allow.clone(),
            deny: self.deny.clone(),
        };
        let signals = analyzer.detect_bot(ctx.user_agent, &config).await;

        if signals.denied.is_empty() {
            return Ok(RuleOutcome::allow(Reason::Bot {
                allowed: signals.allowed,
                denied: signals.denied,
            }));
        }
        Ok(RuleOutcome::deny(
            Reason::Bot {
                allowed: signals.allowed,
                denied: signals.denied,
            },
            BOT_DENY_TTL_SECONDS,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_options_emits_one_default_rule() {
        let rules = detect_bot(vec![]).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].priority, 4);
    }

    #[test]
    fn allow_and_deny_together_is_a_construction_error() {
        let err = detect_bot(vec![BotOptions {
            allow: Some(vec!["GOOGLEBOT".to_string()]),
            deny: Some(vec!["CURL".to_string()]),
            mode: None,
        }])
        .unwrap_err();
        assert!(matches!(
            err,
            ConstructionError::MutuallyExclusiveAllowDeny { kind: "BOT" }
        ));
    }

    #[tokio::test]
    async fn protect_denies_a_denylisted_identifier() {
        let analyzer = portcullis_analyzer::LocalAnalyzer::new();
        let rule = BotRule {
            allow: None,
            deny: Some(vec!["CURL".to_string()]),
        };
        let ctx = LocalRuleContext {
            user_agent: Some("curl/8.0"),
            ..Default::default()
        };
        rule.validate(ctx).await.unwrap();
        let outcome = rule.protect(&analyzer, ctx).await.unwrap();
        assert_eq!(outcome.conclusion, portcullis_primitives::Conclusion::Deny);
        assert_eq!(outcome.ttl, BOT_DENY_TTL_SECONDS);
    }
}
