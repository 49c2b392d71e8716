//! Common types and utilities for Crossvenue
//!
//! This crate provides the venue identifiers and the process-wide venue
//! registry shared by the proxy, the market data pipeline and the CLI.
//!
//! # Modules
//!
//! - [`error`] - Common error types
//! - [`types`] - `VenueKey` and the static venue registry
//! - [`text`] - UTF-8 safe truncation

pub mod error;
pub mod text;
pub mod types;

pub use error::{Error, Result};
pub use text::truncate_utf8;
pub use types::*;
