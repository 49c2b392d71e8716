pub fn default_enabled() -> bool {
    true
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    8080
}

pub fn default_client_id() -> String {
    format!("crossvenue-proxy/{}", env!("CARGO_PKG_VERSION"))
}

pub fn default_timeout_ms() -> u64 {
    10_000
}

pub fn default_max_error_body_bytes() -> usize {
    512
}

pub fn default_metrics_port() -> u16 {
    9090
}

pub fn default_proxy_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

pub fn default_window_days() -> usize {
    30
}

/// Matches the 300-row candle window the venues are checked against
pub fn default_candle_limit() -> usize {
    300
}
