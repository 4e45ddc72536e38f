//! Declarative constructors for the six rule kinds (spec.md §4.D) plus the
//! `Rule` value type and the `LocalRule` capability every in-process rule
//! (Email, Bot, SensitiveInfo) implements. RateLimit and Shield carry no
//! `LocalRule` impl — they are evaluated only by the remote `Client`,
//! matching spec.md §3's "RATE_LIMIT and SHIELD are remote-only" note.

mod bot;
mod composite;
mod email;
mod rate_limit;
mod sensitive_info;
mod shield;

pub use bot::{detect_bot, BotOptions, BotRule};
pub use composite::{protect_signup, ProtectSignupOptions};
pub use email::{validate_email, EmailOptions, EmailRule};
pub use rate_limit::{
    fixed_window, sliding_window, token_bucket, FixedWindowOptions, RateLimitRule,
    SlidingWindowOptions, TokenBucketOptions,
};
pub use sensitive_info::{sensitive_info, SensitiveInfoOptions, SensitiveInfoRule};
pub use shield::{shield, ShieldOptions};

use async_trait::async_trait;
use portcullis_analyzer::Analyzer;
use portcullis_primitives::{Conclusion, DurationError, Reason};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("{kind}: `allow` and `deny` are mutually exclusive")]
    MutuallyExclusiveAllowDeny { kind: &'static str },
    #[error("{field}: {source}")]
    InvalidDuration {
        field: &'static str,
        #[source]
        source: DurationError,
    },
}

/// A single local-rule execution failure (validate or protect). The
/// engine converts either into a `RUN`/`ERROR` `RuleResult` and continues
/// with the next rule — this error type never escapes `protect`.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("required field `{0}` was not supplied on the request")]
    MissingField(&'static str),
}

/// LIVE rules can deny a request; DRY_RUN rules only report what they
/// would have done and evaluation continues regardless of their verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Live,
    DryRun,
}

impl Mode {
    /// Any value other than the exact literal `"LIVE"` — including a
    /// missing value — is `DRY_RUN`. Preserved from the source SDK
    /// (spec.md §9); unrecognized-but-present values are logged.
    pub fn from_option_str(value: Option<&str>) -> Self {
        match value {
            Some("LIVE") => Mode::Live,
            Some(other) => {
                tracing::warn!(mode = other, "unrecognized rule mode, treating as DRY_RUN");
                Mode::DryRun
            }
            None => Mode::DryRun,
        }
    }

    pub fn is_dry_run(self) -> bool {
        matches!(self, Mode::DryRun)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::DryRun
    }
}

/// The request-shaped context a local rule needs. The engine crate owns
/// the full `RequestDetails`/`Context` types; this is the narrow
/// projection local rules actually read, kept here to avoid a dependency
/// cycle between `portcullis-rules` and `portcullis-engine`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRuleContext<'a> {
    pub email: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub body: Option<&'a str>,
}

/// Outcome of a successful local-rule `protect` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub conclusion: Conclusion,
    pub reason: Reason,
    pub ttl: u32,
}

impl RuleOutcome {
    pub fn allow(reason: Reason) -> Self {
        Self {
            conclusion: Conclusion::Allow,
            reason,
            ttl: 0,
        }
    }

    pub fn deny(reason: Reason, ttl: u32) -> Self {
        Self {
            conclusion: Conclusion::Deny,
            reason,
            ttl,
        }
    }
}

/// Capability implemented only by rules the engine can evaluate
/// in-process (spec.md §9's "capability interface that RATE_LIMIT and
/// SHIELD do not implement").
#[async_trait]
pub trait LocalRule: Send + Sync {
    async fn validate(&self, ctx: LocalRuleContext<'_>) -> Result<(), RuleError>;

    async fn protect(
        &self,
        analyzer: &dyn Analyzer,
        ctx: LocalRuleContext<'_>,
    ) -> Result<RuleOutcome, RuleError>;
}

#[derive(Clone)]
pub enum RuleKind {
    RateLimit(RateLimitRule),
    Bot(BotRule),
    Email(EmailRule),
    SensitiveInfo(SensitiveInfoRule),
    Shield,
}

impl RuleKind {
    /// Priorities are fixed by kind, not user-configurable (spec.md §3).
    pub fn fixed_priority(&self) -> u8 {
        match self {
            RuleKind::SensitiveInfo(_) => 1,
            RuleKind::Shield => 2,
            RuleKind::RateLimit(_) => 3,
            RuleKind::Bot(_) => 4,
            RuleKind::Email(_) => 5,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            RuleKind::RateLimit(_) => "RATE_LIMIT",
            RuleKind::Bot(_) => "BOT",
            RuleKind::Email(_) => "EMAIL",
            RuleKind::SensitiveInfo(_) => "SENSITIVE_INFO",
            RuleKind::Shield => "SHIELD",
        }
    }

    /// `Some` for rules evaluated in-process; `None` for RATE_LIMIT and
    /// SHIELD, which only the remote Client can decide.
    pub fn as_local(&self) -> Option<&dyn LocalRule> {
        match self {
            RuleKind::Bot(rule) => Some(rule),
            RuleKind::Email(rule) => Some(rule),
            RuleKind::SensitiveInfo(rule) => Some(rule),
            RuleKind::RateLimit(_) | RuleKind::Shield => None,
        }
    }
}

#[derive(Clone)]
pub struct Rule {
    id: String,
    pub priority: u8,
    pub mode: Mode,
    pub kind: RuleKind,
}

impl Rule {
    pub fn new(kind: RuleKind, mode: Mode) -> Self {
        let priority = kind.fixed_priority();
        Self {
            id: Uuid::new_v4().to_string(),
            priority,
            mode,
            kind,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn as_local(&self) -> Option<&dyn LocalRule> {
        self.kind.as_local()
    }

    /// RATE_LIMIT rules with no explicit `characteristics` inherit the
    /// engine-level characteristics (spec.md §4.H step 5). Returns a
    /// fresh `Rule` — the configured rule list is never mutated in place.
    pub fn with_injected_characteristics(&self, engine_characteristics: &[String]) -> Rule {
        let RuleKind::RateLimit(rate_limit) = &self.kind else {
            return self.clone();
        };
        if rate_limit.characteristics().is_some() {
            return self.clone();
        }
        let mut injected = rate_limit.clone();
        injected.set_characteristics(engine_characteristics.to_vec());
        Rule {
            id: self.id.clone(),
            priority: self.priority,
            mode: self.mode,
            kind: RuleKind::RateLimit(injected),
        }
    }
}
