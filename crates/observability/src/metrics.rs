//! Prometheus metrics infrastructure
//!
//! Metrics are recorded through the `metrics` facade. Until
//! [`init_metrics`] installs the exporter every recording is a no-op, so
//! handlers can record unconditionally.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Install the Prometheus exporter and serve `/metrics` on `port`.
///
/// ```ignore
/// observability::metrics::init_metrics(9090)?;
/// // Metrics available at http://localhost:9090/metrics
/// ```
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Proxy request metrics, labelled by venue
///
/// * `proxy_requests_total{venue,status}` - Requests answered by the proxy
/// * `proxy_request_duration_seconds{venue}` - Time to answer, upstream call included
/// * `proxy_deprecated_rejections_total{venue}` - Requests refused with 410
#[derive(Debug, Clone, Default)]
pub struct ProxyMetrics;

impl ProxyMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Record a completed request.
    pub fn record_request(&self, venue: &str, status: u16, duration: Duration) {
        counter!(
            "proxy_requests_total",
            "venue" => venue.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
        histogram!("proxy_request_duration_seconds", "venue" => venue.to_string())
            .record(duration.as_secs_f64());
    }

    /// Record a request refused by a deprecation rule.
    pub fn record_deprecated(&self, venue: &str) {
        counter!("proxy_deprecated_rejections_total", "venue" => venue.to_string()).increment(1);
    }

    /// Start timing a request for `venue`.
    pub fn start(&self, venue: &str) -> RequestMetricsGuard<'_> {
        RequestMetricsGuard::new(self, venue)
    }
}

/// Records the request on drop.
///
/// The status defaults to 499 so that a request whose handler future is
/// dropped (caller went away) is still counted.
pub struct RequestMetricsGuard<'a> {
    metrics: &'a ProxyMetrics,
    venue: String,
    start: Instant,
    status_code: u16,
}

impl<'a> RequestMetricsGuard<'a> {
    pub fn new(metrics: &'a ProxyMetrics, venue: &str) -> Self {
        Self {
            metrics,
            venue: venue.to_string(),
            start: Instant::now(),
            status_code: 499,
        }
    }

    /// Set the status code (call before drop)
    pub fn set_status(&mut self, code: u16) {
        self.status_code = code;
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for RequestMetricsGuard<'_> {
    fn drop(&mut self) {
        self.metrics
            .record_request(&self.venue, self.status_code, self.start.elapsed());
    }
}
