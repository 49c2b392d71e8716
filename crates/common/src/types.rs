//! Venue identifiers and the static venue registry
//!
//! The registry is process-wide, read-only data compiled into the binary.
//! Everything that needs to know about a venue (display metadata, default
//! upstream host, the current candle and ticker endpoint shapes) looks it
//! up here by [`VenueKey`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a supported venue.
///
/// The set is closed: adding a venue means adding a variant here and a
/// registry entry below, and the compiler points at every `match` that
/// needs a new arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKey {
    Binance,
    Okx,
    Bybit,
    Kraken,
    Coinbase,
}

impl VenueKey {
    /// All venues in registry order
    pub const ALL: [VenueKey; 5] = [
        VenueKey::Binance,
        VenueKey::Okx,
        VenueKey::Bybit,
        VenueKey::Kraken,
        VenueKey::Coinbase,
    ];

    /// Lowercase identifier, also used as the proxy path prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            VenueKey::Binance => "binance",
            VenueKey::Okx => "okx",
            VenueKey::Bybit => "bybit",
            VenueKey::Kraken => "kraken",
            VenueKey::Coinbase => "coinbase",
        }
    }

    /// Registry entry for this venue
    pub fn info(&self) -> &'static VenueInfo {
        let index = match self {
            VenueKey::Binance => 0,
            VenueKey::Okx => 1,
            VenueKey::Bybit => 2,
            VenueKey::Kraken => 3,
            VenueKey::Coinbase => 4,
        };
        &REGISTRY[index]
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Some(VenueKey::Binance),
            "okx" => Some(VenueKey::Okx),
            "bybit" => Some(VenueKey::Bybit),
            "kraken" => Some(VenueKey::Kraken),
            "coinbase" => Some(VenueKey::Coinbase),
            _ => None,
        }
    }
}

impl FromStr for VenueKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::unknown_venue(s))
    }
}

impl fmt::Display for VenueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VenueInfo {
    pub key: VenueKey,
    /// Display label
    pub label: &'static str,
    /// Display color (hex)
    pub color: &'static str,
    /// Upstream REST host for the venue's current API version
    pub default_base_url: &'static str,
    /// Symbol used when the configuration does not name one
    pub default_symbol: &'static str,
}

/// The venue registry, in [`VenueKey::ALL`] order.
pub static REGISTRY: [VenueInfo; 5] = [
    VenueInfo {
        key: VenueKey::Binance,
        label: "Binance",
        color: "#F3BA2F",
        default_base_url: "https://api.binance.com",
        default_symbol: "BTCUSDT",
    },
    VenueInfo {
        key: VenueKey::Okx,
        label: "OKX",
        color: "#000000",
        default_base_url: "https://www.okx.com",
        default_symbol: "BTC-USDT",
    },
    VenueInfo {
        key: VenueKey::Bybit,
        label: "Bybit",
        color: "#F7A600",
        default_base_url: "https://api.bybit.com",
        default_symbol: "BTCUSDT",
    },
    VenueInfo {
        key: VenueKey::Kraken,
        label: "Kraken",
        color: "#5741D9",
        default_base_url: "https://api.kraken.com",
        default_symbol: "XBTUSD",
    },
    VenueInfo {
        key: VenueKey::Coinbase,
        label: "Coinbase",
        color: "#0052FF",
        default_base_url: "https://api.exchange.coinbase.com",
        default_symbol: "BTC-USD",
    },
];

impl VenueInfo {
    /// Daily candle endpoint, relative to the venue's proxy prefix.
    ///
    /// Kraken and Coinbase have no row-limit parameter; they return their
    /// fixed maximum window and `limit` is ignored.
    pub fn daily_candles_path(&self, symbol: &str, limit: usize) -> String {
        match self.key {
            VenueKey::Binance => {
                format!("api/v3/klines?symbol={}&interval=1d&limit={}", symbol, limit)
            }
            VenueKey::Okx => format!(
                "api/v5/market/history-candles?instId={}&bar=1Dutc&limit={}",
                symbol, limit
            ),
            VenueKey::Bybit => format!(
                "v5/market/kline?category=spot&symbol={}&interval=D&limit={}",
                symbol, limit
            ),
            VenueKey::Kraken => format!("0/public/OHLC?pair={}&interval=1440", symbol),
            VenueKey::Coinbase => format!("products/{}/candles?granularity=86400", symbol),
        }
    }

    /// Best bid/ask endpoint, relative to the venue's proxy prefix.
    pub fn ticker_path(&self, symbol: &str) -> String {
        match self.key {
            VenueKey::Binance => format!("api/v3/ticker/bookTicker?symbol={}", symbol),
            VenueKey::Okx => format!("api/v5/market/ticker?instId={}", symbol),
            VenueKey::Bybit => format!("v5/market/tickers?category=linear&symbol={}", symbol),
            VenueKey::Kraken => format!("0/public/Ticker?pair={}", symbol),
            VenueKey::Coinbase => format!("products/{}/ticker", symbol),
        }
    }
}

/// Parse a comma-separated venue list such as `binance,okx`.
///
/// Duplicates are dropped, keeping first occurrence order.
pub fn parse_venue_list(s: &str) -> Result<Vec<VenueKey>> {
    let mut venues = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let venue: VenueKey = part.parse()?;
        if !venues.contains(&venue) {
            venues.push(venue);
        }
    }
    if venues.is_empty() {
        return Err(Error::invalid_input("venue list is empty"));
    }
    Ok(venues)
}
