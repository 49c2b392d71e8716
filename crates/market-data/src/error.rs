//! Market data error types

use common::VenueKey;
use thiserror::Error;

use crate::timestamp::TimestampError;

/// Errors that can occur during market data operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// A row timestamp could not be canonicalized under the strict policy
    #[error("{venue}: row {row}: {source}")]
    Timestamp {
        venue: VenueKey,
        row: usize,
        #[source]
        source: TimestampError,
    },

    /// Payload does not have the venue's candle envelope
    #[error("{venue}: unsupported candle payload: {reason}")]
    UnsupportedPayload { venue: VenueKey, reason: String },

    /// Ticker payload is missing a parseable best bid or ask
    #[error("{venue}: invalid quote payload: {reason}")]
    InvalidQuote { venue: VenueKey, reason: String },

    /// Request through the proxy failed before a response arrived
    #[error("{venue}: fetch failed: {message}")]
    Fetch { venue: VenueKey, message: String },

    /// Proxy relayed a non-success status
    #[error("{venue}: upstream returned {status}: {body}")]
    Upstream {
        venue: VenueKey,
        status: u16,
        body: String,
    },
}

impl MarketDataError {
    /// Venue the failure belongs to
    pub fn venue(&self) -> VenueKey {
        match self {
            Self::Timestamp { venue, .. }
            | Self::UnsupportedPayload { venue, .. }
            | Self::InvalidQuote { venue, .. }
            | Self::Fetch { venue, .. }
            | Self::Upstream { venue, .. } => *venue,
        }
    }

    pub(crate) fn unsupported(venue: VenueKey, reason: impl Into<String>) -> Self {
        Self::UnsupportedPayload {
            venue,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_quote(venue: VenueKey, reason: impl Into<String>) -> Self {
        Self::InvalidQuote {
            venue,
            reason: reason.into(),
        }
    }
}
