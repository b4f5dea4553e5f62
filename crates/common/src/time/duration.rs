//! Duration parsing from strings
//!
//! Option files express expiry in human terms; this module turns those
//! strings into `std::time::Duration`.

use std::time::Duration;

use thiserror::Error;

/// Error type for duration parsing
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DurationParseError {
    #[error("Invalid duration format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Empty duration string")]
    EmptyString,
}

/// Parse a duration string into a Duration
///
/// Supports abbreviated and spelled-out units, optionally separated by
/// whitespace or commas:
/// - `"500ms"`, `"250us"`
/// - `"5s"`, `"5 sec"`, `"5 seconds"`
/// - `"10m"`, `"10 min"`, `"10 minutes"`
/// - `"2h"`, `"2 hours"`, `"3d"`, `"1w"`
/// - `"1h 30m"`, `"2h15m30s"`, `"1 day, 2 hours"`
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use memora_common::time::parse_duration;
///
/// assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
/// assert_eq!(parse_duration("10 minutes").unwrap(), Duration::from_secs(600));
/// assert_eq!(parse_duration("1h 30m").unwrap(), Duration::from_secs(5400));
/// assert_eq!(parse_duration("1s 500ms").unwrap(), Duration::from_millis(1500));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, DurationParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DurationParseError::EmptyString);
    }

    let mut total = Duration::ZERO;
    let mut number = String::new();
    let mut unit = String::new();

    for ch in s.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            if !unit.is_empty() {
                total += component(&number, &unit)?;
                number.clear();
                unit.clear();
            }
            number.push(ch);
        } else if ch.is_whitespace() || ch == ',' {
            continue;
        } else if ch.is_alphabetic() {
            if number.is_empty() {
                return Err(DurationParseError::InvalidFormat(
                    "Expected number before unit".to_string(),
                ));
            }
            unit.push(ch.to_ascii_lowercase());
        } else {
            return Err(DurationParseError::InvalidFormat(format!("Unexpected character '{ch}'")));
        }
    }

    if !number.is_empty() {
        if unit.is_empty() {
            return Err(DurationParseError::InvalidFormat("Missing unit after number".to_string()));
        }
        total += component(&number, &unit)?;
    }

    Ok(total)
}

/// Parse an expiry value, where `"never"` means no expiry
///
/// `"now"` yields a zero duration (already expired on the next fetch).
///
/// ```
/// use std::time::Duration;
///
/// use memora_common::time::parse_expiry;
///
/// assert_eq!(parse_expiry("never").unwrap(), None);
/// assert_eq!(parse_expiry("now").unwrap(), Some(Duration::ZERO));
/// assert_eq!(parse_expiry("90s").unwrap(), Some(Duration::from_secs(90)));
/// ```
pub fn parse_expiry(s: &str) -> Result<Option<Duration>, DurationParseError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "never" => Ok(None),
        "now" => Ok(Some(Duration::ZERO)),
        other => parse_duration(other).map(Some),
    }
}

fn component(number: &str, unit: &str) -> Result<Duration, DurationParseError> {
    let value: f64 =
        number.parse().map_err(|_| DurationParseError::InvalidNumber(number.to_string()))?;

    let seconds = match unit {
        "us" | "usec" | "micros" => value / 1_000_000.0,
        "ms" | "msec" | "millis" => value / 1_000.0,
        "s" | "sec" | "secs" | "second" | "seconds" => value,
        "m" | "min" | "mins" | "minute" | "minutes" => value * 60.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => value * 3600.0,
        "d" | "day" | "days" => value * 86_400.0,
        "w" | "week" | "weeks" => value * 604_800.0,
        _ => return Err(DurationParseError::UnknownUnit(unit.to_string())),
    };

    Duration::try_from_secs_f64(seconds)
        .map_err(|_| DurationParseError::InvalidNumber(number.to_string()))
}
