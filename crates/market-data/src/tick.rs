//! Daily ticks and day axes
//!
//! A [`DayTick`] is milliseconds since the Unix epoch at UTC midnight. The
//! constructor truncates, so a `DayTick` never carries a sub-day component.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds in one UTC day
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// UTC-midnight timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct DayTick(i64);

impl DayTick {
    /// Epoch start, used as the legacy sentinel for unparseable timestamps
    pub const EPOCH: DayTick = DayTick(0);

    /// Truncate an epoch-milliseconds instant to its UTC day.
    pub fn from_millis(millis: i64) -> Self {
        Self(millis - millis.rem_euclid(MILLIS_PER_DAY))
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::from_millis(dt.timestamp_millis())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_datetime(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Tick for the current UTC day
    pub fn today() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.0).unwrap_or_default()
    }

    /// Tick `days` calendar days later (negative moves backward)
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + days * MILLIS_PER_DAY)
    }
}

impl TryFrom<i64> for DayTick {
    type Error = String;

    fn try_from(millis: i64) -> Result<Self, Self::Error> {
        if millis.rem_euclid(MILLIS_PER_DAY) != 0 {
            return Err(format!("{} is not a UTC-midnight tick", millis));
        }
        Ok(Self(millis))
    }
}

impl From<DayTick> for i64 {
    fn from(tick: DayTick) -> Self {
        tick.0
    }
}

impl fmt::Display for DayTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y-%m-%d"))
    }
}

/// Gapless ascending sequence of days with a one-day step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DayAxis {
    ticks: Vec<DayTick>,
}

impl DayAxis {
    /// Every day from `start` to `end`, both inclusive.
    ///
    /// Empty when `start` is after `end`.
    pub fn new(start: DayTick, end: DayTick) -> Self {
        let mut ticks = Vec::new();
        let mut tick = start;
        while tick <= end {
            ticks.push(tick);
            tick = tick.add_days(1);
        }
        Self { ticks }
    }

    /// The `days` most recent days ending at (and including) `end`.
    pub fn trailing(end: DayTick, days: usize) -> Self {
        if days == 0 {
            return Self { ticks: Vec::new() };
        }
        Self::new(end.add_days(1 - days as i64), end)
    }

    pub fn ticks(&self) -> &[DayTick] {
        &self.ticks
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn first(&self) -> Option<DayTick> {
        self.ticks.first().copied()
    }

    pub fn last(&self) -> Option<DayTick> {
        self.ticks.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = DayTick> + '_ {
        self.ticks.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_millis_truncates() {
        // 2023-11-14T22:13:20Z
        let tick = DayTick::from_millis(1_700_000_000_000);
        assert_eq!(tick.as_millis(), 1_699_920_000_000);
        assert_eq!(tick.to_string(), "2023-11-14");
        assert_eq!(tick.as_millis() % MILLIS_PER_DAY, 0);
    }

    #[test]
    fn test_from_millis_before_epoch() {
        let tick = DayTick::from_millis(-1);
        assert_eq!(tick.as_millis(), -MILLIS_PER_DAY);
        assert_eq!(tick.to_string(), "1969-12-31");
    }

    #[test]
    fn test_deserialize_rejects_sub_day() {
        let ok: DayTick = serde_json::from_str("86400000").unwrap();
        assert_eq!(ok, DayTick::EPOCH.add_days(1));
        assert!(serde_json::from_str::<DayTick>("86400001").is_err());
    }

    #[test]
    fn test_axis_inclusive() {
        let start = DayTick::from_millis(0);
        let axis = DayAxis::new(start, start.add_days(4));
        assert_eq!(axis.len(), 5);
        assert_eq!(axis.first(), Some(start));
        assert_eq!(axis.last(), Some(start.add_days(4)));

        for pair in axis.ticks().windows(2) {
            assert_eq!(pair[1].as_millis() - pair[0].as_millis(), MILLIS_PER_DAY);
        }
    }

    #[test]
    fn test_axis_empty_when_reversed() {
        let start = DayTick::from_millis(0);
        assert!(DayAxis::new(start.add_days(1), start).is_empty());
    }

    #[test]
    fn test_trailing_axis() {
        let end = DayTick::from_millis(1_700_000_000_000);
        let axis = DayAxis::trailing(end, 30);
        assert_eq!(axis.len(), 30);
        assert_eq!(axis.last(), Some(end));
        assert_eq!(axis.first(), Some(end.add_days(-29)));

        assert!(DayAxis::trailing(end, 0).is_empty());
    }

    #[test]
    fn test_from_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(DayTick::from_date(date).as_millis(), 1_704_067_200_000);
    }
}
