//! Configuration for Crossvenue
//!
//! One YAML document drives every command: the proxy server, its upstream
//! venue table, logging and metrics, and the `compare`/`probe` clients.
//! Every section has defaults, so an empty document is a valid config.

use common::VenueKey;
use market_data::TimestampPolicy;
use observability::LogFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub compare: CompareConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Sent upstream as `User-Agent`
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Upstream error bodies are cut to this many bytes before relay
    #[serde(default = "default_max_error_body_bytes")]
    pub max_error_body_bytes: usize,
    /// Per-venue overrides; venues not listed use registry defaults
    #[serde(default)]
    pub venues: BTreeMap<VenueKey, VenueConfig>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            client_id: default_client_id(),
            timeout_ms: default_timeout_ms(),
            max_error_body_bytes: default_max_error_body_bytes(),
            venues: BTreeMap::new(),
        }
    }
}

impl ProxyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Effective settings for `venue`.
    pub fn venue(&self, venue: VenueKey) -> VenueConfig {
        self.venues.get(&venue).cloned().unwrap_or_default()
    }

    /// Effective upstream base URL for `venue`.
    pub fn base_url(&self, venue: VenueKey) -> String {
        self.venues
            .get(&venue)
            .and_then(|v| v.base_url.clone())
            .unwrap_or_else(|| venue.info().default_base_url.to_string())
    }

    pub fn is_enabled(&self, venue: VenueKey) -> bool {
        self.venues.get(&venue).map_or(true, |v| v.enabled)
    }

    pub fn enabled_venues(&self) -> Vec<VenueKey> {
        VenueKey::ALL
            .iter()
            .copied()
            .filter(|v| self.is_enabled(*v))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VenueConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Extra legacy path patterns (regex, matched against the path after
    /// the venue segment) answered with 410
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deprecated_paths: Vec<String>,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            enabled: default_enabled(),
            deprecated_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompareConfig {
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    #[serde(default = "default_window_days")]
    pub window_days: usize,
    #[serde(default = "default_candle_limit")]
    pub candle_limit: usize,
    #[serde(default)]
    pub timestamp_policy: TimestampPolicy,
    /// Candle symbol per venue; venues not listed use the registry default
    #[serde(default)]
    pub symbols: BTreeMap<VenueKey, String>,
    /// Ticker symbol per venue; falls back to `symbols`, then the registry
    #[serde(default)]
    pub tickers: BTreeMap<VenueKey, String>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            proxy_url: default_proxy_url(),
            window_days: default_window_days(),
            candle_limit: default_candle_limit(),
            timestamp_policy: TimestampPolicy::default(),
            symbols: BTreeMap::new(),
            tickers: BTreeMap::new(),
        }
    }
}

impl CompareConfig {
    pub fn symbol(&self, venue: VenueKey) -> String {
        self.symbols
            .get(&venue)
            .cloned()
            .unwrap_or_else(|| venue.info().default_symbol.to_string())
    }

    pub fn ticker(&self, venue: VenueKey) -> String {
        self.tickers
            .get(&venue)
            .cloned()
            .unwrap_or_else(|| self.symbol(venue))
    }
}
