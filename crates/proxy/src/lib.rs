//! Exchange proxy router for Crossvenue
//!
//! `GET /<venue>/<path>?<query>` is forwarded to the venue's upstream API
//! with a fixed outbound header set, and the answer is relayed back as JSON.
//!
//! # Behaviour
//!
//! - Retired path shapes are answered with 410 before any outbound call
//! - Upstream errors keep their status and carry a truncated body
//! - Timeouts answer 504, other transport failures 500
//! - Dropping the inbound request drops (and cancels) the outbound call
//!
//! # Modules
//!
//! - [`deprecation`] - Legacy path table
//! - [`relay`] - Body relay chain (declared JSON, sniffed JSON, raw wrapper)
//! - [`upstream`] - Venue base URLs
//! - [`handler`] - Axum handlers and shared state
//! - [`routes`] - Router construction

pub mod deprecation;
pub mod error;
pub mod handler;
pub mod relay;
pub mod routes;
pub mod upstream;

pub use deprecation::DeprecationTable;
pub use error::{ProxyError, Result, SetupError};
pub use handler::ProxyState;
pub use relay::{relay_body, RelayBody};
pub use routes::proxy_routes;
pub use upstream::{Upstream, UpstreamTable};
