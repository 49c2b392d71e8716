//! Server error types

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Startup and lifecycle failures of the HTTP server and health client
#[derive(Error, Debug)]
pub enum ServerError {
    /// Found by the pre-flight port check, before any server is built
    #[error("Port {port} is already in use: {reason}")]
    PortInUse { port: u16, reason: String },

    #[error("Failed to bind {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Health client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ServerError {
    pub fn bind(address: impl Into<String>, source: io::Error) -> Self {
        Self::BindError {
            address: address.into(),
            source,
        }
    }

    pub fn port_in_use(port: u16, reason: impl Into<String>) -> Self {
        Self::PortInUse {
            port,
            reason: reason.into(),
        }
    }
}
