//! Notify interval parsing.
//!
//! Accepts duration strings such as `"10m"`, `"1h30m"` or `"1.5h"`: one or
//! more decimal numbers, each with an optional fraction and a unit suffix.
//! Valid units are `ns`, `us` (or `µs`/`μs`), `ms`, `s`, `m` and `h`.

use std::fmt;
use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;
use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Largest duration accepted, in nanoseconds
const MAX_NANOS: u128 = i64::MAX as u128;

/// Fraction digits beyond this are ignored
const MAX_FRACTION_DIGITS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIntervalError {
    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("duration {0:?} is out of range")]
    Overflow(String),

    #[error("duration {0:?} must be positive")]
    NotPositive(String),
}

const UNITS_HINT: &str = "support units: \"ns\", \"us\" (or \"µs\"), \"ms\", \"s\", \"m\", \"h\"";

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3600 * NANOS_PER_SEC),
        _ => None,
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

/// Parse a duration string into a positive `Duration`.
pub fn parse_interval(input: &str) -> Result<Duration, ParseIntervalError> {
    let invalid = || ParseIntervalError::Invalid(input.to_string());

    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Err(ParseIntervalError::NotPositive(input.to_string()));
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole, after) = split_digits(rest);
        let (fraction, after) = match after.strip_prefix('.') {
            Some(tail) => split_digits(tail),
            None => ("", after),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        let unit_end = after
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after.len());
        let (unit, tail) = after.split_at(unit_end);
        if unit.is_empty() {
            return Err(ParseIntervalError::MissingUnit(input.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| ParseIntervalError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let overflow = || ParseIntervalError::Overflow(input.to_string());
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let mut value = whole.checked_mul(scale).ok_or_else(overflow)?;

        let mut numerator: u128 = 0;
        let mut denominator: u128 = 1;
        for digit in fraction.bytes().take(MAX_FRACTION_DIGITS as usize) {
            numerator = numerator * 10 + u128::from(digit - b'0');
            denominator *= 10;
        }
        value += numerator * scale / denominator;

        total = total.checked_add(value).ok_or_else(overflow)?;
        if total > MAX_NANOS {
            return Err(overflow());
        }
        rest = tail;
    }

    if negative || total == 0 {
        return Err(ParseIntervalError::NotPositive(input.to_string()));
    }

    // MAX_NANOS fits in u64
    Ok(Duration::from_nanos(total as u64))
}

/// The parsed `notify_interval`, kept alongside the string it came from.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct NotifyInterval {
    raw: String,
    duration: Duration,
    delta: TimeDelta,
}

impl NotifyInterval {
    pub fn as_duration(&self) -> Duration {
        self.duration
    }

    pub fn as_time_delta(&self) -> TimeDelta {
        self.delta
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl TryFrom<String> for NotifyInterval {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let duration = parse_interval(&raw).map_err(|e| format!("{e}; {UNITS_HINT}"))?;
        let delta = TimeDelta::from_std(duration)
            .map_err(|_| ParseIntervalError::Overflow(raw.clone()).to_string())?;
        Ok(Self {
            raw,
            duration,
            delta,
        })
    }
}

impl std::str::FromStr for NotifyInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl fmt::Debug for NotifyInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:?})", self.raw, self.duration)
    }
}

impl fmt::Display for NotifyInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
