//! Timestamp canonicalization
//!
//! Venues report candle times as epoch seconds, epoch milliseconds (as
//! numbers or digit strings) or date-time strings with and without an
//! offset. [`canonicalize`] maps all of them onto a [`DayTick`].
//!
//! Strings without an explicit offset are read as UTC, never as host local
//! time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::tick::DayTick;

/// Numeric timestamps below this magnitude are epoch seconds.
pub const SECONDS_THRESHOLD: f64 = 1e12;

/// Largest representable instant, in milliseconds either side of the epoch.
const MAX_ABS_MILLIS: f64 = 8.64e15;

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];
const SHORT_OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"];

/// Why a timestamp could not be canonicalized
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimestampError {
    #[error("timestamp is missing")]
    Missing,

    #[error("timestamp is not finite")]
    NotFinite,

    #[error("timestamp {0} is out of range")]
    OutOfRange(f64),

    #[error("unparseable timestamp '{0}'")]
    Unparseable(String),

    #[error("unsupported timestamp type: {0}")]
    UnsupportedType(&'static str),
}

/// What the normalizer does with a row whose timestamp cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPolicy {
    /// Drop the row and log a warning
    #[default]
    Skip,
    /// Fail the whole normalization
    Strict,
    /// Key the row at the epoch-start tick
    Sentinel,
}

impl TimestampPolicy {
    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "skip" => Some(Self::Skip),
            "strict" => Some(Self::Strict),
            "sentinel" => Some(Self::Sentinel),
            _ => None,
        }
    }
}

impl std::str::FromStr for TimestampPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown timestamp policy: {}", s))
    }
}

/// Canonicalize a JSON timestamp value to its UTC day.
pub fn canonicalize(value: &Value) -> Result<DayTick, TimestampError> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => canonicalize_number(i as f64),
            None => canonicalize_number(n.as_f64().ok_or(TimestampError::NotFinite)?),
        },
        Value::String(s) => canonicalize_str(s),
        Value::Null => Err(TimestampError::Missing),
        Value::Bool(_) => Err(TimestampError::UnsupportedType("bool")),
        Value::Array(_) => Err(TimestampError::UnsupportedType("array")),
        Value::Object(_) => Err(TimestampError::UnsupportedType("object")),
    }
}

/// Legacy behaviour: unreadable timestamps collapse to [`DayTick::EPOCH`].
pub fn canonicalize_or_epoch(value: &Value) -> DayTick {
    canonicalize(value).unwrap_or(DayTick::EPOCH)
}

/// Epoch seconds or milliseconds, told apart by [`SECONDS_THRESHOLD`].
pub fn canonicalize_number(n: f64) -> Result<DayTick, TimestampError> {
    if !n.is_finite() {
        return Err(TimestampError::NotFinite);
    }
    let millis = if n.abs() < SECONDS_THRESHOLD {
        n * 1000.0
    } else {
        n
    };
    if millis.abs() > MAX_ABS_MILLIS {
        return Err(TimestampError::OutOfRange(n));
    }
    Ok(DayTick::from_millis(millis.floor() as i64))
}

/// Decimal number strings are epoch numbers; anything else is a date-time.
pub fn canonicalize_str(s: &str) -> Result<DayTick, TimestampError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::Missing);
    }
    if is_epoch_digits(trimmed) {
        let n: f64 = trimmed
            .parse()
            .map_err(|_| TimestampError::Unparseable(s.to_string()))?;
        return canonicalize_number(n);
    }
    parse_date_time(trimmed)
        .map(DayTick::from_datetime)
        .ok_or_else(|| TimestampError::Unparseable(s.to_string()))
}

/// `-?\d+(\.\d+)?`
fn is_epoch_digits(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    all_digits(whole) && fraction.map_or(true, all_digits)
}

fn parse_date_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let mut text = s.to_string();
    if text.len() == 10 {
        text.push_str("T00:00:00");
    } else if text.as_bytes().get(10) == Some(&b' ') {
        text.replace_range(10..11, "T");
    }

    if text.ends_with('Z') || text.ends_with('z') {
        text.pop();
        text.push_str("+00:00");
    } else if !has_explicit_offset(&text) {
        text.push_str("+00:00");
    }

    OFFSET_FORMATS
        .iter()
        .chain(SHORT_OFFSET_FORMATS.iter())
        .find_map(|fmt| DateTime::parse_from_str(&text, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// True when the time part (after `YYYY-MM-DDT`) carries a `+hh:mm` or
/// `-hhmm` style offset.
fn has_explicit_offset(text: &str) -> bool {
    text.get(11..)
        .map(|time| time.contains('+') || time.contains('-'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // 2023-11-14 00:00:00 UTC
    const NOV_14: i64 = 1_699_920_000_000;

    #[test]
    fn test_seconds_and_millis_agree() {
        let seconds = canonicalize(&json!(1_700_000_000)).unwrap();
        let millis = canonicalize(&json!(1_700_000_000_000i64)).unwrap();
        assert_eq!(seconds, millis);
        assert_eq!(seconds.as_millis(), NOV_14);
    }

    #[test]
    fn test_fractional_seconds() {
        let tick = canonicalize(&json!(1_700_000_000.75)).unwrap();
        assert_eq!(tick.as_millis(), NOV_14);
    }

    #[test]
    fn test_digit_strings_are_numbers() {
        assert_eq!(canonicalize(&json!("1700000000000")).unwrap().as_millis(), NOV_14);
        assert_eq!(canonicalize(&json!("1700000000")).unwrap().as_millis(), NOV_14);
    }

    #[test]
    fn test_strings_without_offset_are_utc() {
        for s in [
            "2023-11-14",
            "2023-11-14T23:59:59",
            "2023-11-14 23:59:59",
            "2023-11-14T00:00:00.123",
            "2023-11-14T12:30",
        ] {
            assert_eq!(canonicalize_str(s).unwrap().as_millis(), NOV_14, "{}", s);
        }
    }

    #[test]
    fn test_strings_with_offset_are_honoured() {
        assert_eq!(
            canonicalize_str("2023-11-14T22:13:20Z").unwrap().as_millis(),
            NOV_14
        );
        // 01:00 at +02:00 is 23:00 the previous UTC day
        assert_eq!(
            canonicalize_str("2023-11-15T01:00:00+02:00").unwrap().as_millis(),
            NOV_14
        );
        assert_eq!(
            canonicalize_str("2023-11-14T20:00:00-0500").unwrap().as_millis(),
            NOV_14 + crate::tick::MILLIS_PER_DAY
        );
        assert_eq!(
            canonicalize_str("Tue, 14 Nov 2023 22:13:20 GMT").unwrap().as_millis(),
            NOV_14
        );
    }

    #[test]
    fn test_fractional_strings_match_numbers() {
        assert_eq!(
            canonicalize(&json!("1700000000.5")),
            canonicalize(&json!(1_700_000_000.5))
        );
        assert_eq!(canonicalize_str("1700000000000.25").unwrap().as_millis(), NOV_14);
        assert_eq!(canonicalize_str("-86400.5"), canonicalize_number(-86_400.5));
        for malformed in ["1700000000.", ".5", "1.2.3", "-"] {
            assert!(
                matches!(canonicalize_str(malformed), Err(TimestampError::Unparseable(_))),
                "{}",
                malformed
            );
        }
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(canonicalize(&Value::Null), Err(TimestampError::Missing));
        assert_eq!(canonicalize_str("  "), Err(TimestampError::Missing));
        assert!(matches!(
            canonicalize_str("yesterday"),
            Err(TimestampError::Unparseable(_))
        ));
        assert!(matches!(
            canonicalize_number(f64::NAN),
            Err(TimestampError::NotFinite)
        ));
        assert!(matches!(
            canonicalize_number(1e20),
            Err(TimestampError::OutOfRange(_))
        ));
        assert_eq!(
            canonicalize(&json!(true)),
            Err(TimestampError::UnsupportedType("bool"))
        );
    }

    #[test]
    fn test_sentinel_fallback() {
        assert_eq!(canonicalize_or_epoch(&json!("garbage")), DayTick::EPOCH);
        assert_eq!(
            canonicalize_or_epoch(&json!(1_700_000_000)).as_millis(),
            NOV_14
        );
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(TimestampPolicy::parse("STRICT"), Some(TimestampPolicy::Strict));
        assert_eq!("skip".parse::<TimestampPolicy>(), Ok(TimestampPolicy::Skip));
        assert!("lenient".parse::<TimestampPolicy>().is_err());
        assert_eq!(TimestampPolicy::default(), TimestampPolicy::Skip);
    }
}
