//! The `protectSignup` composite (spec.md §4.D): a single constructor
//! bundling the three rules a signup endpoint typically wants, built
//! from its own sub-option structs so callers don't have to import the
//! individual constructors.

use portcullis_primitives::EmailReason;

use crate::{
    bot::BotOptions,
    email::EmailOptions,
    rate_limit::SlidingWindowOptions,
    ConstructionError, Rule,
};

#[derive(Debug, Clone, Default)]
pub struct ProtectSignupOptions {
    pub rate_limit: Option<SlidingWindowOptions>,
    pub bot: Option<BotOptions>,
    pub email: Option<EmailOptions>,
}

/// Returns the concatenation of (sliding-window rate limit, bot
/// detection, email validation) built from `options`'s sub-options.
/// `rate_limit` is left out entirely when absent — `sliding_window`
/// with no options yields an empty sequence — while `bot` and `email`
/// still emit their single default rule, matching each constructor's
/// own zero-options behavior (spec.md §4.D).
pub fn protect_signup(options: ProtectSignupOptions) -> Result<Vec<Rule>, ConstructionError> {
    let mut rules = Vec::new();

    let rate_limit_opts = options.rate_limit.into_iter().collect();
    rules.extend(crate::rate_limit::sliding_window(rate_limit_opts)?);

    let bot_opts = match options.bot {
        Some(opts) => vec![opts],
        None => vec![BotOptions::default()],
    };
    rules.extend(crate::bot::detect_bot(bot_opts)?);

    let email_opts = match options.email {
        Some(opts) => vec![opts],
        None => vec![EmailOptions::default()],
    };
    rules.extend(crate::email::validate_email(email_opts)?);

    Ok(rules)
}
