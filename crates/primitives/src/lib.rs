//! Mechanical leaf components of the decision engine: duration parsing,
//! the header map, the block cache, and the Decision/Reason value
//! objects (spec.md §2, components A, B, C, G).

pub mod cache;
pub mod decision;
pub mod duration;
pub mod headers;

pub use cache::BlockCache;
pub use decision::{Conclusion, Decision, EmailReason, EntityKind, Reason, RuleResult, RuleState};
pub use duration::{parse_duration_seconds, DurationError, DurationValue, IntoDurationSeconds};
pub use headers::HeaderMap;
