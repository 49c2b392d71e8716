//! Cross-venue market data normalization for Crossvenue
//!
//! This crate turns heterogeneous exchange candle payloads into one
//! comparable, day-indexed series per venue.
//!
//! # Core Components
//!
//! - [`tick`] - UTC day ticks and gapless day axes
//! - [`timestamp`] - Timestamp canonicalization (seconds, millis, date strings)
//! - [`normalize`] - Per-venue envelope extraction into normalized series
//! - [`align`] - Re-indexing of normalized series onto a shared axis
//! - [`common_index`] - Latest day on which all requested venues have data
//! - [`quote`] - Best bid/ask and candle row-count contracts
//! - `client` - Fetching through the exchange proxy (feature `client`)
//!
//! # Key Invariants
//!
//! - Normalized series are strictly increasing by tick, one point per day
//! - Aligned series carry exactly one point per axis tick for every venue
//! - Missing data stays missing; nothing is interpolated or forward-filled

pub mod align;
#[cfg(feature = "client")]
pub mod client;
pub mod common_index;
pub mod error;
pub mod normalize;
pub mod quote;
pub mod tick;
pub mod timestamp;

pub use align::{align, AlignedSeries, AlignedVenue};
#[cfg(feature = "client")]
pub use client::ProxyDataClient;
pub use common_index::{find_common_index, CommonIndex};
pub use error::MarketDataError;
pub use normalize::{normalize, NormalizedPoint, NormalizedSeries};
pub use quote::{check_candle_rows, parse_best_quote, BestQuote, CandleRowCheck};
pub use tick::{DayAxis, DayTick, MILLIS_PER_DAY};
pub use timestamp::{canonicalize, TimestampError, TimestampPolicy};

pub type Result<T> = std::result::Result<T, MarketDataError>;
