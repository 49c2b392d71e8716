//! HTTP server implementation using Axum
//!
//! Wraps a router with request tracing and runs it under the [`Server`]
//! lifecycle.

use async_trait::async_trait;
use axum::Router;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::health::{health_routes, HealthState};
use crate::traits::Server;

/// HTTP server implementation using Axum
///
/// ```ignore
/// use server::{HttpServer, ServerConfig, ServerExt};
///
/// let server = HttpServer::new("proxy", ServerConfig::new("0.0.0.0", 8080), proxy_router);
/// server.run_with_ctrl_c().await?;
/// ```
#[derive(Clone)]
pub struct HttpServer {
    name: String,
    config: ServerConfig,
    router: Router,
    running: Arc<AtomicBool>,
    bound_addr: Arc<RwLock<Option<SocketAddr>>>,
}

impl HttpServer {
    /// Create a server for `router`, adding `/health` and request tracing.
    pub fn new(name: impl Into<String>, config: ServerConfig, router: Router) -> Self {
        let name = name.into();
        let router = router
            .merge(health_routes(Arc::new(HealthState::new(name.clone()))))
            .layer(TraceLayer::new_for_http());

        Self {
            name,
            config,
            router,
            running: Arc::new(AtomicBool::new(false)),
            bound_addr: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the router (for testing or inspection)
    pub fn router(&self) -> &Router {
        &self.router
    }
}

#[async_trait]
impl Server for HttpServer {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> Option<SocketAddr> {
        *self.bound_addr.read()
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self, shutdown_token: CancellationToken) -> Result<()> {
        let addr = self.config.addr()?;

        info!(server = %self.name, %addr, "Starting HTTP server");

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind(addr.to_string(), e))?;

        let local_addr = listener.local_addr().map_err(ServerError::Io)?;
        *self.bound_addr.write() = Some(local_addr);

        info!(server = %self.name, %local_addr, "HTTP server listening");

        self.running.store(true, Ordering::SeqCst);

        let result = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
                info!("HTTP server received shutdown signal");
            })
            .await;

        self.running.store(false, Ordering::SeqCst);
        *self.bound_addr.write() = None;

        match result {
            Ok(()) => {
                info!(server = %self.name, "HTTP server shutdown complete");
                Ok(())
            }
            Err(e) => {
                error!(%e, "HTTP server error");
                Err(ServerError::Io(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ServerExt;
    use axum::routing::get;
    use std::time::Duration;

    fn test_router() -> Router {
        Router::new().route("/ping", get(|| async { "pong" }))
    }

    #[tokio::test]
    async fn test_http_server_serves_and_shuts_down() {
        let server = HttpServer::new("test", ServerConfig::ephemeral(), test_router());
        let probe = server.clone();
        let (handle, token) = server.spawn();

        let mut addr = None;
        for _ in 0..50 {
            if let Some(a) = probe.address() {
                addr = Some(a);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let addr = addr.expect("server did not bind");
        assert!(probe.is_running());

        let body = reqwest::get(format!("http://{}/ping", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "pong");

        let health: serde_json::Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["service"], "test");

        token.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(result.is_ok(), "Server should shutdown within timeout");
        assert!(!probe.is_running());
    }

    #[tokio::test]
    async fn test_bind_conflict() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = HttpServer::new("test", ServerConfig::new("127.0.0.1", port), test_router());
        let result = server.run(CancellationToken::new()).await;
        assert!(matches!(result, Err(ServerError::BindError { .. })));
    }
}
