//! Observability infrastructure for Crossvenue
//!
//! This crate provides:
//! - Structured logging via tracing (always on stderr)
//! - Prometheus metrics
//! - Proxy-specific metric helpers
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("crossvenue", LogFormat::Pretty)?;
//!
//! // Optional
//! observability::metrics::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, ProxyMetrics, RequestMetricsGuard};
