//! EMAIL rule construction and local evaluation (spec.md §4.D, §4.H).

use std::collections::HashSet;

use async_trait::async_trait;
use portcullis_analyzer::{Analyzer, EmailValidationOptions, EmailValidity};
use portcullis_primitives::{EmailReason, Reason};

use crate::{ConstructionError, LocalRule, LocalRuleContext, Mode, Rule, RuleError, RuleKind, RuleOutcome};

const EMAIL_DENY_TTL_SECONDS: u32 = 300;

#[derive(Debug, Clone)]
pub struct EmailRule {
    pub block: HashSet<EmailReason>,
    pub require_top_level_domain: bool,
    pub allow_domain_literal: bool,
}

impl Default for EmailRule {
    fn default() -> Self {
        Self {
            block: HashSet::new(),
            require_top_level_domain: true,
            allow_domain_literal: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmailOptions {
    pub block: Option<Vec<EmailReason>>,
    pub require_top_level_domain: Option<bool>,
    pub allow_domain_literal: Option<bool>,
    pub mode: Option<String>,
}

/// `validateEmail` always emits at least one rule, even with no options.
pub fn validate_email(options: Vec<EmailOptions>) -> Result<Vec<Rule>, ConstructionError> {
    if options.is_empty() {
        return Ok(vec![Rule::new(
            RuleKind::Email(EmailRule::default()),
            Mode::DryRun,
        )]);
    }
    Ok(options
        .into_iter()
        .map(|opts| {
            let defaults = EmailRule::default();
            Rule::new(
                RuleKind::Email(EmailRule {
                    block: opts.block.map(|b| b.into_iter().collect()).unwrap_or_default(),
                    require_top_level_domain: opts
                        .require_top_level_domain
                        .unwrap_or(defaults.require_top_level_domain),
                    allow_domain_literal: opts
                        .allow_domain_literal
                        .unwrap_or(defaults.allow_domain_literal),
                }),
                Mode::from_option_str(opts.mode.as_deref()),
            )
        })
        .collect())
}

#[async_trait]
impl LocalRule for EmailRule {
    async fn validate(&self, ctx: LocalRuleContext<'_>) -> Result<(), RuleError> {
        if ctx.email.is_none() {
            return Err(RuleError::MissingField("email"));
        }
        Ok(())
    }

    async fn protect(
        &self,
        analyzer: &dyn Analyzer,
        ctx: LocalRuleContext<'_>,
    ) -> Result<RuleOutcome, RuleError> {
        let email = ctx.email.ok_or(RuleError::MissingField("email"))?;
        let opts = EmailValidationOptions {
            block: self.block.clone(),
            require_top_level_domain: self.require_top_level_domain,
            allow_domain_literal: self.allow_domain_literal,
        };
        let check = analyzer.is_valid_email(email, &opts).await;

        let reason = Reason::Email {
            email_types: check.blocked,
        };
        match check.validity {
            EmailValidity::Valid => Ok(RuleOutcome::allow(reason)),
            EmailValidity::Invalid => Ok(RuleOutcome::deny(reason, EMAIL_DENY_TTL_SECONDS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_options_emits_one_default_rule() {
        let rules = validate_email(vec![]).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].priority, 5);
    }

    #[test]
    fn options_override_defaults() {
        let rules = validate_email(vec![EmailOptions {
            block: Some(vec![EmailReason::Disposable]),
            require_top_level_domain: Some(false),
            allow_domain_literal: Some(true),
            mode: Some("LIVE".to_string()),
        }])
        .unwrap();
        let RuleKind::Email(rule) = &rules[0].kind else {
            panic!("expected Email rule");
        };
        assert!(rule.block.contains(&EmailReason::Disposable));
        assert!(!rule.require_top_level_domain);
        assert!(rule.allow_domain_literal);
        assert_eq!(rules[0].mode, Mode::Live);
    }

    #[tokio::test]
    async fn protect_denies_a_malformed_address() {
        let analyzer = portcullis_analyzer::LocalAnalyzer::new();
        let rule = EmailRule::default();
        let ctx = LocalRuleContext {
            email: Some("not-an-email"),
            ..Default::default()
        };
        rule.validate(ctx).await.unwrap();
        let outcome = rule.protect(&analyzer, ctx).await.unwrap();
        assert_eq!(outcome.conclusion, portcullis_primitives::Conclusion::Deny);
    }

    #[tokio::test]
    async fn validate_fails_without_an_email_on_the_request() {
        let rule = EmailRule::default();
        let ctx = LocalRuleContext::default();
        let err = rule.validate(ctx).await.unwrap_err();
        assert!(matches!(err, RuleError::MissingField("email")));
    }
}
