//! Response-shape contracts for ticker and candle endpoints
//!
//! These are acceptance checks over payloads relayed by the proxy: a ticker
//! must carry a numeric best bid and ask, and a candle response is counted
//! against the requested window.

use common::VenueKey;
use serde::Serialize;
use serde_json::Value;

use crate::error::MarketDataError;
use crate::normalize::{candle_rows, coerce_price};
use crate::Result;

/// Top of book
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BestQuote {
    pub bid: f64,
    pub ask: f64,
}

impl BestQuote {
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }
}

/// Extract the best bid and ask from a venue's ticker payload.
pub fn parse_best_quote(venue: VenueKey, payload: &Value) -> Result<BestQuote> {
    let (bid, ask) = match venue {
        VenueKey::Binance => (payload.get("bidPrice"), payload.get("askPrice")),
        VenueKey::Okx => {
            let first = payload.get("data").and_then(|d| d.get(0));
            (
                first.and_then(|t| t.get("bidPx")),
                first.and_then(|t| t.get("askPx")),
            )
        }
        VenueKey::Bybit => {
            let first = payload
                .get("result")
                .and_then(|r| r.get("list"))
                .and_then(|l| l.get(0));
            (
                first.and_then(|t| t.get("bid1Price")),
                first.and_then(|t| t.get("ask1Price")),
            )
        }
        VenueKey::Kraken => {
            let pair = payload
                .get("result")
                .and_then(Value::as_object)
                .and_then(|r| r.values().next());
            (
                pair.and_then(|t| t.get("b")).and_then(|b| b.get(0)),
                pair.and_then(|t| t.get("a")).and_then(|a| a.get(0)),
            )
        }
        VenueKey::Coinbase => (payload.get("bid"), payload.get("ask")),
    };

    let bid = bid
        .and_then(coerce_price)
        .ok_or_else(|| MarketDataError::invalid_quote(venue, "missing or non-numeric bid"))?;
    let ask = ask
        .and_then(coerce_price)
        .ok_or_else(|| MarketDataError::invalid_quote(venue, "missing or non-numeric ask"))?;

    Ok(BestQuote { bid, ask })
}

/// Row count of a candle response against the requested window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CandleRowCheck {
    pub rows: usize,
    pub requested: usize,
}

impl CandleRowCheck {
    /// Fewer rows than requested means short upstream history, not a failure.
    pub fn is_complete(&self) -> bool {
        self.rows >= self.requested
    }
}

pub fn check_candle_rows(
    venue: VenueKey,
    payload: &Value,
    requested: usize,
) -> Result<CandleRowCheck> {
    let rows = candle_rows(venue, payload)?.len();
    Ok(CandleRowCheck { rows, requested })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_bybit_ticker() {
        let payload = json!({
            "retCode": 0,
            "result": {
                "category": "linear",
                "list": [{ "symbol": "BTCUSDT", "bid1Price": "37000.5", "ask1Price": "37001.0" }]
            }
        });
        let quote = parse_best_quote(VenueKey::Bybit, &payload).unwrap();
        assert_eq!(quote.bid, 37000.5);
        assert_eq!(quote.ask, 37001.0);
        assert_eq!(quote.spread(), 0.5);
    }

    #[test]
    fn test_other_venue_tickers() {
        let binance = json!({ "symbol": "BTCUSDT", "bidPrice": "1.0", "askPrice": "2.0" });
        assert_eq!(
            parse_best_quote(VenueKey::Binance, &binance).unwrap(),
            BestQuote { bid: 1.0, ask: 2.0 }
        );

        let okx = json!({ "code": "0", "data": [{ "bidPx": "3", "askPx": "4" }] });
        assert_eq!(parse_best_quote(VenueKey::Okx, &okx).unwrap().mid(), 3.5);

        let kraken = json!({
            "error": [],
            "result": { "XXBTZUSD": { "a": ["5.1", "1", "1.000"], "b": ["5.0", "2", "2.000"] } }
        });
        let quote = parse_best_quote(VenueKey::Kraken, &kraken).unwrap();
        assert_eq!((quote.bid, quote.ask), (5.0, 5.1));

        let coinbase = json!({ "bid": "6", "ask": "7", "price": "6.5" });
        assert_eq!(parse_best_quote(VenueKey::Coinbase, &coinbase).unwrap().ask, 7.0);
    }

    #[test]
    fn test_invalid_ticker() {
        let payload = json!({ "result": { "list": [{ "bid1Price": "", "ask1Price": "1" }] } });
        assert_matches!(
            parse_best_quote(VenueKey::Bybit, &payload),
            Err(MarketDataError::InvalidQuote { venue: VenueKey::Bybit, .. })
        );
        assert!(parse_best_quote(VenueKey::Binance, &json!({})).is_err());
    }

    #[test]
    fn test_candle_row_check() {
        let payload = json!({ "result": { "list": [[1, 1, 1, 1, 1], [2, 2, 2, 2, 2]] } });
        let check = check_candle_rows(VenueKey::Bybit, &payload, 300).unwrap();
        assert_eq!(check.rows, 2);
        assert!(!check.is_complete());

        let check = check_candle_rows(VenueKey::Bybit, &payload, 2).unwrap();
        assert!(check.is_complete());

        assert!(check_candle_rows(VenueKey::Okx, &json!({}), 1).is_err());
    }
}
