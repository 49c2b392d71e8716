//! Common error types for Crossvenue

use thiserror::Error;

/// Common error type used across Crossvenue crates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid input was provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Venue identifier is not part of the registry
    #[error("Unknown venue: {0}")]
    UnknownVenue(String),
}

/// Result type alias using the common Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an unknown venue error
    pub fn unknown_venue(name: impl Into<String>) -> Self {
        Self::UnknownVenue(name.into())
    }
}
