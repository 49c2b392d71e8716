//! Port availability checks
//!
//! Checking before binding is racy: another process can take the port in
//! between. These checks give early feedback; the real bind decides.

use tokio::net::TcpListener;
use tracing::{debug, error, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

/// Fail early if the configured port is already taken.
///
/// Port 0 (ephemeral) always passes.
pub async fn validate_port_available(config: &ServerConfig) -> Result<()> {
    if config.port == 0 {
        return Ok(());
    }
    if config.port < 1024 {
        warn!(port = config.port, "Privileged port (requires root/admin privileges)");
    }

    let addr = format!("{}:{}", config.host, config.port);
    debug!(%addr, "Checking port availability");

    match TcpListener::bind(&addr).await {
        Ok(listener) => {
            drop(listener);
            Ok(())
        }
        Err(e) => {
            error!(port = config.port, error = %e, "Port is NOT available");
            Err(ServerError::port_in_use(config.port, e.to_string()))
        }
    }
}

/// Returns `true` if the port appears to be in use.
pub async fn is_port_in_use(host: &str, port: u16) -> bool {
    TcpListener::bind(format!("{}:{}", host, port)).await.is_err()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_port_in_use() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(is_port_in_use("127.0.0.1", port).await);
        assert!(matches!(
            validate_port_available(&ServerConfig::new("127.0.0.1", port)).await,
            Err(ServerError::PortInUse { .. })
        ));

        drop(listener);
        assert!(!is_port_in_use("127.0.0.1", port).await);
    }

    #[tokio::test]
    async fn test_ephemeral_port_passes() {
        assert!(validate_port_available(&ServerConfig::ephemeral()).await.is_ok());
    }
}
