//! Human-readable duration parsing (`"1h30m"`, `"90s"`, or a bare integer
//! of seconds) into an integer seconds value.
//!
//! Segments are additive, may appear in any order, and whitespace between
//! them is ignored. `ms` segments are summed with everything else in
//! milliseconds and only rounded to the nearest second, half-up, once at
//! the end — so `"1500ms"` is `2`, not `1`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("duration must not be empty")]
    Empty,
    #[error("negative durations are not allowed: {0}")]
    Negative(i64),
    #[error("invalid duration format: {0:?}")]
    InvalidFormat(String),
    #[error("unknown duration unit: {0:?}")]
    UnknownUnit(String),
    #[error("duration exceeds the maximum representable value of {}", i32::MAX)]
    Overflow,
}

const MAX_SECONDS: u128 = i32::MAX as u128;

/// Anything that can be interpreted as a duration in seconds: a bare
/// non-negative integer, or a `"<number><unit>"+` string.
pub trait IntoDurationSeconds {
    fn into_duration_seconds(self) -> Result<u32, DurationError>;
}

macro_rules! impl_for_signed {
    ($($t:ty),*) => {
        $(impl IntoDurationSeconds for $t {
            fn into_duration_seconds(self) -> Result<u32, DurationError> {
                if self < 0 {
                    return Err(DurationError::Negative(self as i64));
                }
                let v = self as u128;
                if v > MAX_SECONDS {
                    return Err(DurationError::Overflow);
                }
                Ok(v as u32)
            }
        })*
    };
}

macro_rules! impl_for_unsigned {
    ($($t:ty),*) => {
        $(impl IntoDurationSeconds for $t {
            fn into_duration_seconds(self) -> Result<u32, DurationError> {
                let v = self as u128;
                if v > MAX_SECONDS {
                    return Err(DurationError::Overflow);
                }
                Ok(v as u32)
            }
        })*
    };
}

impl_for_signed!(i8, i16, i32, i64, isize);
impl_for_unsigned!(u8, u16, u32, u64, usize);

impl IntoDurationSeconds for &str {
    fn into_duration_seconds(self) -> Result<u32, DurationError> {
        parse_text(self)
    }
}

impl IntoDurationSeconds for String {
    fn into_duration_seconds(self) -> Result<u32, DurationError> {
        parse_text(&self)
    }
}

fn ms_per_unit(unit: &str) -> Option<u128> {
    match unit {
        "ms" => Some(1),
        "s" | "sec" => Some(1_000),
        "m" | "min" => Some(60_000),
        "h" | "hour" => Some(3_600_000),
        "d" | "day" => Some(86_400_000),
        _ => None,
    }
}

fn parse_text(input: &str) -> Result<u32, DurationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }

    let bytes = trimmed.as_bytes();
    let len = bytes.len();
    let mut i = 0usize;
    let mut total_ms: u128 = 0;
    let mut saw_segment = false;

    while i < len {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            break;
        }

        let num_start = i;
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == num_start {
            return Err(DurationError::InvalidFormat(trimmed.to_string()));
        }
        let number: u128 = trimmed[num_start..i]
            .parse()
            .map_err(|_| DurationError::InvalidFormat(trimmed.to_string()))?;

        let unit_start = i;
        while i < len && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        if i == unit_start {
            return Err(DurationError::InvalidFormat(trimmed.to_string()));
        }
        let unit = trimmed[unit_start..i].to_ascii_lowercase();
        let per_unit = ms_per_unit(&unit).ok_or(DurationError::UnknownUnit(unit))?;

        let segment_ms = number
            .checked_mul(per_unit)
            .ok_or(DurationError::Overflow)?;
        total_ms = total_ms
            .checked_add(segment_ms)
            .ok_or(DurationError::Overflow)?;
        saw_segment = true;
    }

    if !saw_segment {
        return Err(DurationError::Empty);
    }

    let rounded_seconds = (total_ms + 500) / 1000;
    if rounded_seconds > MAX_SECONDS {
        return Err(DurationError::Overflow);
    }
    Ok(rounded_seconds as u32)
}

/// Parse any supported duration representation into seconds.
pub fn parse_duration_seconds(value: impl IntoDurationSeconds) -> Result<u32, DurationError> {
    value.into_duration_seconds()
}

/// An owned, deferred duration value for rule option structs — call sites
/// may hand in a bare second count or a human-readable string, resolved
/// to seconds only once the enclosing rule is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationValue {
    Seconds(u32),
    Text(String),
}

impl DurationValue {
    pub fn resolve(&self) -> Result<u32, DurationError> {
        match self {
            DurationValue::Seconds(s) => parse_duration_seconds(*s),
            DurationValue::Text(s) => parse_duration_seconds(s.as_str()),
        }
    }
}

impl From<u32> for DurationValue {
    fn from(value: u32) -> Self {
        DurationValue::Seconds(value)
    }
}

impl From<&str> for DurationValue {
    fn from(value: &str) -> Self {
        DurationValue::Text(value.to_string())
    }
}

impl From<String> for DurationValue {
    fn from(value: String) -> Self {
        DurationValue::Text(value)
    }
}

impl Default for DurationValue {
    fn default() -> Self {
        DurationValue::Seconds(0)
    }
}
