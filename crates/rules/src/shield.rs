//! SHIELD rule construction (spec.md §4.D). SHIELD carries no extra
//! fields and no `LocalRule` impl — like RATE_LIMIT, it is decided only
//! by the remote Client (spec.md §3: "RATE_LIMIT and SHIELD are
//! remote-only").

use crate::{ConstructionError, Mode, Rule, RuleKind};

#[derive(Debug, Clone, Default)]
pub struct ShieldOptions {
    pub mode: Option<String>,
}

/// `shield` always emits at least one rule, even with no options.
pub fn shield(options: Vec<ShieldOptions>) -> Result<Vec<Rule>, ConstructionError> {
    if options.is_empty() {
        return Ok(vec![Rule::new(RuleKind::Shield, Mode::DryRun)]);
    }
    Ok(options
        .into_iter()
        .map(|opts| Rule::new(RuleKind::Shield, Mode::from_option_str(opts.mode.as_deref())))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_options_emits_one_default_rule() {
        let rules = shield(vec![]).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].priority, 2);
        assert!(rules[0].as_local().is_none());
    }

    #[test]
    fn explicit_live_mode_is_honored() {
        let rules = shield(vec![ShieldOptions {
            mode: Some("LIVE".to_string()),
        }])
        .unwrap();
        assert_eq!(rules[0].mode, Mode::Live);
    }
}
