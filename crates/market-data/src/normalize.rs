//! Per-venue candle normalization
//!
//! Each venue wraps its candles differently and encodes a row either as a
//! positional array or as a keyed record. [`normalize`] selects the venue's
//! envelope and field layout with an exhaustive `match` on [`VenueKey`] and
//! emits a [`NormalizedSeries`]: one `(DayTick, close)` point per day,
//! ascending, with a missing or non-numeric close kept as `None`.
//!
//! No I/O happens here; the same payload always yields the same series.

use common::VenueKey;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::MarketDataError;
use crate::tick::DayTick;
use crate::timestamp::{canonicalize, TimestampError, TimestampPolicy};
use crate::Result;

/// Positional index of the close in every supported row layout
pub const CLOSE_INDEX: usize = 4;

/// Positional index of the candle time in every supported row layout
pub const TIME_INDEX: usize = 0;

/// Record keys that may hold a candle time, in lookup order
const TIME_KEYS: [&str; 6] = ["time", "timestamp", "ts", "t", "openTime", "startTime"];

/// One day's close for one venue
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedPoint {
    pub tick: DayTick,
    pub price: Option<f64>,
}

impl NormalizedPoint {
    pub fn new(tick: DayTick, price: Option<f64>) -> Self {
        Self { tick, price }
    }
}

/// Strictly ascending, one point per day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSeries {
    venue: VenueKey,
    points: Vec<NormalizedPoint>,
}

impl NormalizedSeries {
    /// Build from unordered points. Sorts by tick and keeps the first point
    /// seen for each day.
    pub fn from_points(venue: VenueKey, mut points: Vec<NormalizedPoint>) -> Self {
        // stable sort, so dedup keeps the earliest row of each day
        points.sort_by_key(|p| p.tick);
        let before = points.len();
        points.dedup_by_key(|p| p.tick);
        if points.len() != before {
            debug!(
                venue = %venue,
                dropped = before - points.len(),
                "Dropped duplicate daily rows"
            );
        }
        Self { venue, points }
    }

    pub fn venue(&self) -> VenueKey {
        self.venue
    }

    pub fn points(&self) -> &[NormalizedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Close at `tick`; `None` both for a missing day and an absent close.
    pub fn price_at(&self, tick: DayTick) -> Option<f64> {
        self.points
            .binary_search_by_key(&tick, |p| p.tick)
            .ok()
            .and_then(|i| self.points[i].price)
    }
}

/// Normalize a raw candle payload for `venue`.
pub fn normalize(
    venue: VenueKey,
    payload: &Value,
    policy: TimestampPolicy,
) -> Result<NormalizedSeries> {
    let rows = candle_rows(venue, payload)?;
    let mut points = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let (time, close) = read_row(venue, row);
        let tick = match time.map_or(Err(TimestampError::Missing), canonicalize) {
            Ok(tick) => tick,
            Err(source) => match policy {
                TimestampPolicy::Skip => {
                    warn!(venue = %venue, row = index, error = %source, "Skipping row with unreadable timestamp");
                    continue;
                }
                TimestampPolicy::Strict => {
                    return Err(MarketDataError::Timestamp {
                        venue,
                        row: index,
                        source,
                    });
                }
                TimestampPolicy::Sentinel => DayTick::EPOCH,
            },
        };
        points.push(NormalizedPoint::new(tick, close.and_then(coerce_price)));
    }

    Ok(NormalizedSeries::from_points(venue, points))
}

/// Locate the candle rows inside a venue's response envelope.
///
/// A bare array is accepted for every venue.
pub(crate) fn candle_rows(venue: VenueKey, payload: &Value) -> Result<&[Value]> {
    if let Some(rows) = payload.as_array() {
        return Ok(rows.as_slice());
    }

    let rows = match venue {
        VenueKey::Binance | VenueKey::Coinbase => None,
        VenueKey::Okx => payload.get("data").and_then(Value::as_array),
        VenueKey::Bybit => payload
            .get("result")
            .and_then(|r| r.get("list"))
            .and_then(Value::as_array),
        VenueKey::Kraken => payload
            .get("result")
            .and_then(Value::as_object)
            .and_then(kraken_pair_rows),
    };

    rows.map(Vec::as_slice)
        .ok_or_else(|| MarketDataError::unsupported(venue, envelope_hint(venue)))
}

/// Kraken keys the rows by pair name next to a `last` cursor.
fn kraken_pair_rows(result: &Map<String, Value>) -> Option<&Vec<Value>> {
    result
        .iter()
        .filter(|(key, _)| key.as_str() != "last")
        .find_map(|(_, value)| value.as_array())
}

fn envelope_hint(venue: VenueKey) -> &'static str {
    match venue {
        VenueKey::Binance | VenueKey::Coinbase => "expected a top-level array of candles",
        VenueKey::Okx => "expected candles under 'data'",
        VenueKey::Bybit => "expected candles under 'result.list'",
        VenueKey::Kraken => "expected candles under 'result.<pair>'",
    }
}

/// Record keys that may hold the close for `venue`, in lookup order
fn close_keys(venue: VenueKey) -> &'static [&'static str] {
    match venue {
        VenueKey::Binance | VenueKey::Bybit | VenueKey::Coinbase => &["close"],
        VenueKey::Okx | VenueKey::Kraken => &["close", "c"],
    }
}

/// Pull `(time, close)` out of a row; keyed fields win over positions.
fn read_row(venue: VenueKey, row: &Value) -> (Option<&Value>, Option<&Value>) {
    match row {
        Value::Object(record) => {
            let time = TIME_KEYS.iter().find_map(|k| record.get(*k));
            let close = close_keys(venue).iter().find_map(|k| record.get(*k));
            (time, close)
        }
        Value::Array(cells) => (cells.get(TIME_INDEX), cells.get(CLOSE_INDEX)),
        _ => (None, None),
    }
}

/// Numbers and numeric strings become prices; everything else is absent.
///
/// Zero is a valid price.
pub(crate) fn coerce_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    price.is_finite().then_some(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    const DAY1: i64 = 1_699_920_000_000; // 2023-11-14
    const DAY2: i64 = DAY1 + 86_400_000;

    fn ticks(series: &NormalizedSeries) -> Vec<i64> {
        series.points().iter().map(|p| p.tick.as_millis()).collect()
    }

    fn prices(series: &NormalizedSeries) -> Vec<Option<f64>> {
        series.points().iter().map(|p| p.price).collect()
    }

    #[test]
    fn test_binance_positional() {
        let payload = json!([
            [DAY2, "36000.0", "37000.0", "35000.0", "36500.5", "100.0", DAY2 + 86_399_999],
            [DAY1, "35000.0", "36000.0", "34000.0", "35500.0", "120.0", DAY1 + 86_399_999]
        ]);
        let series = normalize(VenueKey::Binance, &payload, TimestampPolicy::Skip).unwrap();
        assert_eq!(ticks(&series), vec![DAY1, DAY2]);
        assert_eq!(prices(&series), vec![Some(35500.0), Some(36500.5)]);
    }

    #[test]
    fn test_okx_envelope_string_millis() {
        let payload = json!({
            "code": "0",
            "data": [
                [DAY2.to_string(), "1", "2", "0.5", "1.5", "10"],
                [DAY1.to_string(), "1", "2", "0.5", "1.25", "10"]
            ]
        });
        let series = normalize(VenueKey::Okx, &payload, TimestampPolicy::Skip).unwrap();
        assert_eq!(ticks(&series), vec![DAY1, DAY2]);
        assert_eq!(prices(&series), vec![Some(1.25), Some(1.5)]);
    }

    #[test]
    fn test_bybit_envelope_newest_first() {
        let payload = json!({
            "retCode": 0,
            "result": {
                "category": "spot",
                "list": [
                    [DAY2.to_string(), "1", "2", "0.5", "2.0", "10", "20"],
                    [DAY1.to_string(), "1", "2", "0.5", "1.0", "10", "20"]
                ]
            }
        });
        let series = normalize(VenueKey::Bybit, &payload, TimestampPolicy::Skip).unwrap();
        assert_eq!(ticks(&series), vec![DAY1, DAY2]);
        assert_eq!(prices(&series), vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_kraken_pair_envelope_seconds() {
        let payload = json!({
            "error": [],
            "result": {
                "XXBTZUSD": [
                    [DAY1 / 1000, "1", "2", "0.5", "3.5", "1.1", "10", 5]
                ],
                "last": DAY1 / 1000
            }
        });
        let series = normalize(VenueKey::Kraken, &payload, TimestampPolicy::Skip).unwrap();
        assert_eq!(ticks(&series), vec![DAY1]);
        assert_eq!(prices(&series), vec![Some(3.5)]);
    }

    #[test]
    fn test_coinbase_low_high_open_close() {
        // [time, low, high, open, close, volume]
        let payload = json!([[DAY1 / 1000, 1.0, 5.0, 2.0, 4.0, 100.0]]);
        let series = normalize(VenueKey::Coinbase, &payload, TimestampPolicy::Skip).unwrap();
        assert_eq!(prices(&series), vec![Some(4.0)]);
    }

    #[test]
    fn test_keyed_records_preferred() {
        let payload = json!({
            "data": [
                { "ts": "2023-11-14T08:00:00", "c": "7.5" },
                { "time": DAY2, "close": 8, "c": "ignored" }
            ]
        });
        let series = normalize(VenueKey::Okx, &payload, TimestampPolicy::Skip).unwrap();
        assert_eq!(ticks(&series), vec![DAY1, DAY2]);
        assert_eq!(prices(&series), vec![Some(7.5), Some(8.0)]);
    }

    #[test]
    fn test_absent_is_not_zero() {
        let payload = json!([
            [DAY1, "0", "0", "0", "0", "0"],
            [DAY2, "1", "1", "1", null, "1"],
            [DAY2 + 86_400_000, "1", "1", "1", "n/a", "1"],
            [DAY2 + 2 * 86_400_000, "1", "1", "1"]
        ]);
        let series = normalize(VenueKey::Binance, &payload, TimestampPolicy::Skip).unwrap();
        assert_eq!(prices(&series), vec![Some(0.0), None, None, None]);
    }

    #[test]
    fn test_duplicate_days_keep_first() {
        let payload = json!([
            [DAY1 + 1_000, "1", "1", "1", "10", "1"],
            [DAY2, "1", "1", "1", "20", "1"],
            [DAY1 + 5_000, "1", "1", "1", "11", "1"]
        ]);
        let series = normalize(VenueKey::Binance, &payload, TimestampPolicy::Skip).unwrap();
        assert_eq!(ticks(&series), vec![DAY1, DAY2]);
        assert_eq!(prices(&series), vec![Some(10.0), Some(20.0)]);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let payload = json!({
            "result": { "list": [
                [DAY2.to_string(), "1", "2", "0.5", "2.0"],
                [DAY1.to_string(), "1", "2", "0.5", null],
                [DAY1.to_string(), "1", "2", "0.5", "9.0"]
            ]}
        });
        let first = normalize(VenueKey::Bybit, &payload, TimestampPolicy::Skip).unwrap();
        let second = normalize(VenueKey::Bybit, &payload, TimestampPolicy::Skip).unwrap();
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_timestamp_policies() {
        let payload = json!([
            ["not a date", "1", "1", "1", "5", "1"],
            [DAY1, "1", "1", "1", "6", "1"]
        ]);

        let skipped = normalize(VenueKey::Binance, &payload, TimestampPolicy::Skip).unwrap();
        assert_eq!(ticks(&skipped), vec![DAY1]);

        let sentinel = normalize(VenueKey::Binance, &payload, TimestampPolicy::Sentinel).unwrap();
        assert_eq!(ticks(&sentinel), vec![0, DAY1]);
        assert_eq!(sentinel.price_at(DayTick::EPOCH), Some(5.0));

        let strict = normalize(VenueKey::Binance, &payload, TimestampPolicy::Strict);
        assert_matches!(
            strict,
            Err(MarketDataError::Timestamp { venue: VenueKey::Binance, row: 0, .. })
        );
    }

    #[test]
    fn test_wrong_envelope() {
        let payload = json!({ "unexpected": true });
        assert_matches!(
            normalize(VenueKey::Bybit, &payload, TimestampPolicy::Skip),
            Err(MarketDataError::UnsupportedPayload { venue: VenueKey::Bybit, .. })
        );
        assert_matches!(
            normalize(VenueKey::Binance, &payload, TimestampPolicy::Skip),
            Err(MarketDataError::UnsupportedPayload { .. })
        );
    }

    #[test]
    fn test_price_at() {
        let series = NormalizedSeries::from_points(
            VenueKey::Okx,
            vec![
                NormalizedPoint::new(DayTick::from_millis(DAY2), Some(2.0)),
                NormalizedPoint::new(DayTick::from_millis(DAY1), None),
            ],
        );
        assert_eq!(series.price_at(DayTick::from_millis(DAY2)), Some(2.0));
        assert_eq!(series.price_at(DayTick::from_millis(DAY1)), None);
        assert_eq!(series.price_at(DayTick::EPOCH), None);
    }
}
