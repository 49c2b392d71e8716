//! Server infrastructure for Crossvenue
//!
//! An axum HTTP server with a uniform lifecycle and graceful shutdown.
//!
//! # Architecture
//!
//! Servers implement [`Server`]; [`ServerExt`] adds `spawn()` and
//! `run_until_signal()`. Shutdown is driven by a `CancellationToken` from
//! `tokio_util`, so one signal stops the HTTP server and any sibling tasks
//! holding child tokens.
//!
//! ```ignore
//! use server::{HttpServer, ServerConfig, ServerExt};
//!
//! let server = HttpServer::new("proxy", ServerConfig::new("0.0.0.0", 8080), router);
//! server.run_until_signal().await?;
//! ```
//!
//! # Modules
//!
//! - [`config`] - Bind configuration and default ports
//! - [`traits`] - `Server` and `ServerExt`
//! - [`http`] - HTTP server using Axum
//! - [`health`] - Health endpoint and client
//! - [`shutdown`] - Signal-driven shutdown
//! - [`port_validator`] - Early port checks

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod port_validator;
pub mod shutdown;
pub mod traits;

pub use config::{ports, ServerConfig};
pub use error::{Result, ServerError};
pub use health::{ConnectionStatus, HealthClient, HealthState};
pub use http::HttpServer;
pub use port_validator::validate_port_available;
pub use shutdown::{shutdown_signal, ShutdownController};
pub use traits::{Server, ServerExt};
