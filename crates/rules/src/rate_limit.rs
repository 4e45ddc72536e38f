//! RATE_LIMIT rule construction (spec.md §4.D). Rate limiting is
//! remote-only: the engine never runs these locally, it only forwards
//! them (with characteristics injected) to `Client::decide`.

use portcullis_primitives::DurationValue;

use crate::{ConstructionError, Mode, Rule, RuleKind};

#[derive(Clone)]
pub enum RateLimitRule {
    TokenBucket {
        match_pattern: Option<String>,
        characteristics: Option<Vec<String>>,
        refill_rate: u32,
        interval: u32,
        capacity: u32,
    },
    FixedWindow {
        match_pattern: Option<String>,
        characteristics: Option<Vec<String>>,
        max: u32,
        window: u32,
    },
    SlidingWindow {
        match_pattern: Option<String>,
        characteristics: Option<Vec<String>>,
        max: u32,
        interval: u32,
    },
}

impl RateLimitRule {
    pub fn characteristics(&self) -> Option<&[String]> {
        match self {
            RateLimitRule::TokenBucket { characteristics, .. }
            | RateLimitRule::FixedWindow { characteristics, .. }
            | RateLimitRule::SlidingWindow { characteristics, .. } => characteristics.as_deref(),
        }
    }

    pub(crate) fn set_characteristics(&mut self, values: Vec<String>) {
        match self {
            RateLimitRule::TokenBucket { characteristics, .. }
            | RateLimitRule::FixedWindow { characteristics, .. }
            | RateLimitRule::SlidingWindow { characteristics, .. } => {
                *characteristics = Some(values);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TokenBucketOptions {
    pub match_pattern: Option<String>,
    pub characteristics: Option<Vec<String>>,
    pub refill_rate: u32,
    pub interval: DurationValue,
    pub capacity: u32,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FixedWindowOptions {
    pub match_pattern: Option<String>,
    pub characteristics: Option<Vec<String>>,
    pub max: u32,
    pub window: DurationValue,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SlidingWindowOptions {
    pub match_pattern: Option<String>,
    pub characteristics: Option<Vec<String>>,
    pub max: u32,
    pub interval: DurationValue,
    pub mode: Option<String>,
}

pub fn token_bucket(options: Vec<TokenBucketOptions>) -> Result<Vec<Rule>, ConstructionError> {
    options
        .into_iter()
        .map(|opts| {
            let interval = opts.interval.resolve().map_err(|source| ConstructionError::InvalidDuration {
                field: "interval",
                source,
            })?;
            Ok(Rule::new(
                RuleKind::RateLimit(RateLimitRule::TokenBucket {
                    match_pattern: opts.match_pattern,
                    characteristics: opts.characteristics,
                    refill_rate: opts.refill_rate,
                    interval,
                    capacity: opts.capacity,
                }),
                Mode::from_option_str(opts.mode.as_deref()),
            ))
        })
        .collect()
}

pub fn fixed_window(options: Vec<FixedWindowOptions>) -> Result<Vec<Rule>, ConstructionError> {
    options
        .into_iter()
        .map(|opts| {
            let window = opts.window.resolve().map_err(|source| ConstructionError::InvalidDuration {
                field: "window",
                source,
            })?;
            Ok(Rule::new(
                RuleKind::RateLimit(RateLimitRule::FixedWindow {
                    match_pattern: opts.match_pattern,
                    characteristics: opts.characteristics,
                    max: opts.max,
                    window,
                }),
                Mode::from_option_str(opts.mode.as_deref()),
            ))
        })
        .collect()
}

pub fn sliding_window(options: Vec<SlidingWindowOptions>) -> Result<Vec<Rule>, ConstructionError> {
    options
        .into_iter()
        .map(|opts| {
            let interval = opts.interval.resolve().map_err(|source| ConstructionError::InvalidDuration {
                field: "interval",
                source,
            })?;
            Ok(Rule::new(
                RuleKind::RateLimit(RateLimitRule::SlidingWindow {
                    match_pattern: opts.match_pattern,
                    characteristics: opts.characteristics,
                    max: opts.max,
                    interval,
                }),
                Mode::from_option_str(opts.mode.as_deref()),
            ))
        })
        .collect()
}
