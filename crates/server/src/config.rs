//! Server configuration

use crate::error::{Result, ServerError};
use std::net::SocketAddr;

/// Default port assignments
pub mod ports {
    /// Proxy HTTP port
    pub const PROXY_HTTP: u16 = 8080;
    /// Prometheus exporter port
    pub const METRICS: u16 = 9090;
}

/// Bind configuration for the HTTP server
///
/// ```
/// use server::config::ServerConfig;
///
/// let config = ServerConfig::new("127.0.0.1", 8080);
/// assert_eq!(config.addr().unwrap().port(), 8080);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port 0 binds an ephemeral port
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Loopback on an ephemeral port
    pub fn ephemeral() -> Self {
        Self::new("127.0.0.1", 0)
    }

    /// Parse the socket address from host and port
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("0.0.0.0", ports::PROXY_HTTP)
    }
}
