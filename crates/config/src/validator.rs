use crate::*;
use regex::Regex;
use thiserror::Error;
use url::Url;

const MAX_WINDOW_DAYS: usize = 1000;
const LONG_TIMEOUT_MS: u64 = 60_000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid URL for {field}: '{url}' ({message})")]
    InvalidUrl {
        field: String,
        url: String,
        message: String,
    },

    #[error("Venue {venue}: deprecated path pattern '{pattern}' does not compile: {message}")]
    InvalidPattern {
        venue: VenueKey,
        pattern: String,
        message: String,
    },

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("compare.window_days must be between 1 and {max}, got {value}")]
    InvalidWindow { value: usize, max: usize },

    #[error("At least one venue must be enabled")]
    NoEnabledVenues,

    #[error("{field} must not be empty")]
    Empty { field: String },

    #[error("Environment variable in {field} is not set: {value}")]
    UnresolvedEnvVar { field: String, value: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &AppConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_server(&config.server, &mut report);
    validate_proxy(&config.proxy, &mut report);
    validate_metrics(&config.metrics, &config.server, &mut report);
    validate_compare(&config.compare, &mut report);

    report
}

fn validate_server(server: &ServerSection, report: &mut ValidationReport) {
    if server.host.is_empty() {
        report.add_error(ValidationError::Empty {
            field: "server.host".to_string(),
        });
    }
    if server.port == 0 {
        report.add_warning("server.port", "Port 0 binds an ephemeral port");
    } else if server.port < 1024 {
        report.add_warning("server.port", "Privileged port (< 1024) may require root");
    }
}

fn validate_proxy(proxy: &ProxyConfig, report: &mut ValidationReport) {
    if proxy.client_id.trim().is_empty() {
        report.add_error(ValidationError::Empty {
            field: "proxy.client_id".to_string(),
        });
    }
    check_env_resolved("proxy.client_id", &proxy.client_id, report);

    if proxy.timeout_ms == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "proxy.timeout_ms".to_string(),
        });
    } else if proxy.timeout_ms > LONG_TIMEOUT_MS {
        report.add_warning(
            "proxy.timeout_ms",
            "Timeouts over 60s hold inbound connections open for a long time",
        );
    }

    if proxy.max_error_body_bytes == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "proxy.max_error_body_bytes".to_string(),
        });
    }

    for venue in VenueKey::ALL {
        let field = format!("proxy.venues.{}", venue);
        let Some(venue_config) = proxy.venues.get(&venue) else {
            report.add_default(&format!("{}.base_url", field), venue.info().default_base_url);
            continue;
        };

        match &venue_config.base_url {
            Some(base_url) => {
                check_env_resolved(&format!("{}.base_url", field), base_url, report);
                check_url(&format!("{}.base_url", field), base_url, report);
            }
            None => report.add_default(&format!("{}.base_url", field), venue.info().default_base_url),
        }

        for pattern in &venue_config.deprecated_paths {
            if let Err(e) = Regex::new(pattern) {
                report.add_error(ValidationError::InvalidPattern {
                    venue,
                    pattern: pattern.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    if proxy.enabled_venues().is_empty() {
        report.add_error(ValidationError::NoEnabledVenues);
    }
}

fn validate_metrics(metrics: &MetricsConfig, server: &ServerSection, report: &mut ValidationReport) {
    if metrics.enabled && metrics.port == server.port {
        report.add_warning("metrics.port", "Metrics port equals server.port; serve will fail to bind");
    }
}

fn validate_compare(compare: &CompareConfig, report: &mut ValidationReport) {
    check_env_resolved("compare.proxy_url", &compare.proxy_url, report);
    check_url("compare.proxy_url", &compare.proxy_url, report);

    if compare.window_days == 0 || compare.window_days > MAX_WINDOW_DAYS {
        report.add_error(ValidationError::InvalidWindow {
            value: compare.window_days,
            max: MAX_WINDOW_DAYS,
        });
    }

    if compare.candle_limit == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "compare.candle_limit".to_string(),
        });
    } else if compare.candle_limit < compare.window_days {
        report.add_warning(
            "compare.candle_limit",
            "Fewer candles than window days; the start of the window will be absent",
        );
    }

    for (venue, symbol) in compare.symbols.iter().chain(compare.tickers.iter()) {
        if symbol.trim().is_empty() {
            report.add_error(ValidationError::Empty {
                field: format!("compare symbol for {}", venue),
            });
        }
    }
}

fn check_url(field: &str, value: &str, report: &mut ValidationReport) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => report.add_error(ValidationError::InvalidUrl {
            field: field.to_string(),
            url: value.to_string(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => report.add_error(ValidationError::InvalidUrl {
            field: field.to_string(),
            url: value.to_string(),
            message: e.to_string(),
        }),
    }
}

fn check_env_resolved(field: &str, value: &str, report: &mut ValidationReport) {
    if has_unresolved_env_vars(value) {
        report.add_error(ValidationError::UnresolvedEnvVar {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}
