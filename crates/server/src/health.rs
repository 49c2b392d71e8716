//! Health endpoint and health client

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::Result;

/// Shared state for the health endpoint
#[derive(Debug, Clone)]
pub struct HealthState {
    pub service_name: String,
    pub start_time: Instant,
}

impl HealthState {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<HealthState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
    }))
}

/// Create health check router
pub fn health_routes(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Reachability of a remote HTTP service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub service: String,
    pub address: String,
    pub connected: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

/// HTTP client for health checks
///
/// Reuse one client across checks; it holds a connection pool.
#[derive(Clone)]
pub struct HealthClient {
    client: reqwest::Client,
}

impl HealthClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// GET `<base_url>/health` and report whether it answered 2xx.
    pub async fn check_http(&self, service_name: &str, base_url: &str) -> ConnectionStatus {
        let start = Instant::now();
        let health_url = format!("{}/health", base_url.trim_end_matches('/'));

        let (connected, error) = match self.client.get(&health_url).send().await {
            Ok(response) if response.status().is_success() => (true, None),
            Ok(response) => (false, Some(format!("HTTP {}", response.status()))),
            Err(e) => (false, Some(e.to_string())),
        };

        ConnectionStatus {
            service: service_name.to_string(),
            address: base_url.to_string(),
            connected,
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error,
        }
    }
}
