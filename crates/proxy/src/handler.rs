//! Proxy request handlers

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::{truncate_utf8, VenueKey};
use config::ProxyConfig;
use observability::ProxyMetrics;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::deprecation::DeprecationTable;
use crate::error::{ProxyError, Result, SetupError};
use crate::relay::relay_body;
use crate::upstream::UpstreamTable;

/// Shared, read-only proxy state.
///
/// Built once at startup; requests never write to it, so it is shared
/// behind an `Arc` without locking.
pub struct ProxyState {
    client: reqwest::Client,
    upstreams: UpstreamTable,
    deprecations: DeprecationTable,
    max_error_body_bytes: usize,
    metrics: ProxyMetrics,
}

impl ProxyState {
    pub fn from_config(config: &ProxyConfig) -> std::result::Result<Self, SetupError> {
        let mut deprecations = DeprecationTable::builtin()?;
        for venue in VenueKey::ALL {
            let venue_config = config.venue(venue);
            deprecations.extend(venue, venue_config.deprecated_paths.iter().map(String::as_str))?;
        }

        // The only headers ever sent upstream; caller headers are dropped.
        let mut outbound = HeaderMap::new();
        outbound.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(config.client_id.as_str())
            .default_headers(outbound)
            .timeout(config.timeout())
            .build()?;

        info!(
            timeout_ms = config.timeout_ms,
            enabled = ?config.enabled_venues(),
            "Proxy state initialized"
        );

        Ok(Self {
            client,
            upstreams: UpstreamTable::from_config(config)?,
            deprecations,
            max_error_body_bytes: config.max_error_body_bytes,
            metrics: ProxyMetrics::new(),
        })
    }

    pub fn upstreams(&self) -> &UpstreamTable {
        &self.upstreams
    }

    pub fn deprecations(&self) -> &DeprecationTable {
        &self.deprecations
    }
}

/// GET /:venue/*rest - Forward to the venue's upstream
pub async fn proxy_handler(
    State(state): State<Arc<ProxyState>>,
    Path((venue, _)): Path<(String, String)>,
    uri: Uri,
) -> Response {
    let label = VenueKey::parse(&venue).map_or("unknown", |v| v.as_str());
    let mut guard = state.metrics.start(label);

    let response = match forward(&state, &venue, &uri).await {
        Ok(response) => response,
        Err(err) => {
            if matches!(err, ProxyError::Deprecated { .. }) {
                state.metrics.record_deprecated(label);
            }
            err.into_response()
        }
    };

    guard.set_status(response.status().as_u16());
    response
}

async fn forward(state: &ProxyState, venue: &str, uri: &Uri) -> Result<Response> {
    let key = VenueKey::parse(venue).ok_or_else(|| ProxyError::UnknownVenue(venue.to_string()))?;
    let upstream = state
        .upstreams
        .get(key)
        .ok_or_else(|| ProxyError::UnknownVenue(venue.to_string()))?;
    if !upstream.enabled {
        return Err(ProxyError::VenueDisabled(key.to_string()));
    }

    let raw_path = upstream_path(uri);
    let path = canonical_path(raw_path)
        .ok_or_else(|| ProxyError::InvalidPath(raw_path.to_string()))?;
    let path = path.as_str();

    // Checked on the same string the outbound URL is built from.
    if let Some(pattern) = state.deprecations.check(key, path) {
        info!(venue = %key, path, pattern, "Rejected retired endpoint");
        return Err(ProxyError::Deprecated {
            venue: key.to_string(),
            path: path.to_string(),
            pattern: pattern.to_string(),
        });
    }

    let target = upstream.target(path, uri.query());
    let started = Instant::now();
    debug!(venue = %key, %target, "Forwarding request");

    let response = state.client.get(&target).send().await.map_err(|e| {
        let err = ProxyError::from_reqwest(&e);
        error!(venue = %key, %target, error = %e, "Upstream request failed");
        err
    })?;

    let status = response.status();
    if !status.is_success() {
        let details = read_error_body(response, state.max_error_body_bytes)
            .await
            .map_err(|e| {
                error!(venue = %key, %target, error = %e, "Failed to read upstream error body");
                ProxyError::from_reqwest(&e)
            })?;
        warn!(
            venue = %key,
            path,
            status = status.as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Upstream returned error"
        );
        return Err(ProxyError::Upstream { status, details });
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let body = response.bytes().await.map_err(|e| {
        error!(venue = %key, %target, error = %e, "Failed to read upstream body");
        ProxyError::from_reqwest(&e)
    })?;

    let latency_ms = started.elapsed().as_millis() as u64;

    let relayed = relay_body(content_type.as_deref(), body);
    debug!(
        venue = %key,
        path,
        status = status.as_u16(),
        relay = relayed.kind(),
        latency_ms,
        "Relayed upstream response"
    );
    Ok(relayed.into_response_with(status))
}

/// Path after the venue segment, still percent-encoded, without the query.
fn upstream_path(uri: &Uri) -> &str {
    uri.path()
        .trim_start_matches('/')
        .split_once('/')
        .map_or("", |(_, rest)| rest)
}

/// The path the upstream will actually see.
///
/// Percent-encoded unreserved characters are decoded, empty and `.`
/// segments dropped and `..` resolved, the same way the outbound URL parser
/// would. `None` when `..` climbs above the venue root.
pub(crate) fn canonical_path(raw: &str) -> Option<String> {
    let decoded = decode_unreserved(raw);
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(|c: char| c == '/' || c == '\\') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }

    let mut path = segments.join("/");
    if !path.is_empty() && decoded.ends_with('/') {
        path.push('/');
    }
    Some(path)
}

/// Decode `%XX` escapes of unreserved characters (`A-Z a-z 0-9 - . _ ~`);
/// every other escape is left as is.
fn decode_unreserved(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let escape = rest.get(pos + 1..pos + 3);
        match escape.and_then(unreserved_byte) {
            Some(b) => {
                out.push(char::from(b));
                rest = &rest[pos + 3..];
            }
            None => {
                out.push('%');
                rest = &rest[pos + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn unreserved_byte(hex: &str) -> Option<u8> {
    u8::from_str_radix(hex, 16)
        .ok()
        .filter(|&b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

/// Read at most `max` bytes of an error body and drop the rest unread.
async fn read_error_body(
    mut response: reqwest::Response,
    max: usize,
) -> std::result::Result<String, reqwest::Error> {
    let mut buf: Vec<u8> = Vec::new();
    while buf.len() < max {
        match response.chunk().await? {
            Some(chunk) => buf.extend_from_slice(&chunk),
            None => break,
        }
    }
    buf.truncate(max);
    let text = String::from_utf8_lossy(&buf);
    Ok(truncate_utf8(&text, max).to_string())
}

#[derive(Debug, Serialize)]
pub struct VenueEntry {
    pub key: VenueKey,
    pub label: &'static str,
    pub color: &'static str,
    pub enabled: bool,
    pub base_url: String,
    pub deprecated_rules: usize,
}

/// GET /venues - The venue registry with this proxy's upstream settings
pub async fn list_venues(State(state): State<Arc<ProxyState>>) -> Json<Vec<VenueEntry>> {
    let venues = state
        .upstreams
        .iter()
        .map(|(key, upstream)| {
            let info = key.info();
            VenueEntry {
                key,
                label: info.label,
                color: info.color,
                enabled: upstream.enabled,
                base_url: upstream.base_url.to_string(),
                deprecated_rules: state.deprecations.rule_count(key),
            }
        })
        .collect();
    Json(venues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_path() {
        let uri: Uri = "/bybit/v5/market/tickers?category=linear".parse().unwrap();
        assert_eq!(upstream_path(&uri), "v5/market/tickers");

        let uri: Uri = "/coinbase/products/BTC-USD/candles".parse().unwrap();
        assert_eq!(upstream_path(&uri), "products/BTC-USD/candles");

        let uri: Uri = "/kraken/0/public/Ticker%3Fx".parse().unwrap();
        assert_eq!(upstream_path(&uri), "0/public/Ticker%3Fx");

        let uri: Uri = "/binance".parse().unwrap();
        assert_eq!(upstream_path(&uri), "");
    }

    #[test]
    fn test_canonical_path() {
        let canonical = canonical_path;
        assert_eq!(canonical("v5/market/tickers").as_deref(), Some("v5/market/tickers"));
        assert_eq!(canonical("/market/tickers").as_deref(), Some("market/tickers"));
        assert_eq!(canonical("./market//tickers").as_deref(), Some("market/tickers"));
        assert_eq!(canonical("v5/../market/tickers").as_deref(), Some("market/tickers"));
        assert_eq!(canonical("v5/%2e%2E/market/tickers").as_deref(), Some("market/tickers"));
        assert_eq!(canonical("v5\\..\\market/tickers").as_deref(), Some("market/tickers"));
        assert_eq!(canonical("%6Darket/tickers").as_deref(), Some("market/tickers"));
        assert_eq!(canonical("products/").as_deref(), Some("products/"));
        assert_eq!(canonical("").as_deref(), Some(""));
    }

    #[test]
    fn test_canonical_path_keeps_reserved_escapes() {
        assert_eq!(
            canonical_path("0/public/Ticker%3Fx%2Fy%E2%82%AC").as_deref(),
            Some("0/public/Ticker%3Fx%2Fy%E2%82%AC")
        );
        assert_eq!(canonical_path("100%").as_deref(), Some("100%"));
    }

    #[test]
    fn test_canonical_path_rejects_escape_above_root() {
        assert_eq!(canonical_path(".."), None);
        assert_eq!(canonical_path("v5/../../market"), None);
        assert_eq!(canonical_path("%2e%2e/x"), None);
    }
}
