//! Fetching venue data through the exchange proxy.
//!
//! The client only talks to the proxy (`<proxy>/<venue>/<path>`), never to
//! an exchange directly, so deprecation rules and the outbound header policy
//! apply to every fetch.

use common::{truncate_utf8, VenueKey};
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::MarketDataError;
use crate::normalize::{normalize, NormalizedSeries};
use crate::quote::{parse_best_quote, BestQuote};
use crate::timestamp::TimestampPolicy;
use crate::Result;

/// Longest error body kept in [`MarketDataError::Upstream`]
const MAX_ERROR_BODY: usize = 256;

/// HTTP client for the proxy.
#[derive(Clone)]
pub struct ProxyDataClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyDataClient {
    /// Create a client for the proxy at `proxy_url` with a per-request timeout.
    pub fn new(proxy_url: &str, timeout: Duration) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: proxy_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL of the proxy.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `<proxy>/<venue>/<path>` and decode the JSON body.
    pub async fn fetch_json(&self, venue: VenueKey, path: &str) -> Result<Value> {
        let url = format!("{}/{}/{}", self.base_url, venue, path.trim_start_matches('/'));
        debug!(%venue, %url, "Fetching through proxy");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::Fetch {
                venue,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Upstream {
                venue,
                status: status.as_u16(),
                body: error_body_prefix(response).await,
            });
        }

        response.json().await.map_err(|e| MarketDataError::Fetch {
            venue,
            message: format!("Failed to parse response: {}", e),
        })
    }

    /// Fetch up to `limit` daily candles and normalize them.
    pub async fn fetch_series(
        &self,
        venue: VenueKey,
        symbol: &str,
        limit: usize,
        policy: TimestampPolicy,
    ) -> Result<NormalizedSeries> {
        let path = venue.info().daily_candles_path(symbol, limit);
        let payload = self.fetch_json(venue, &path).await?;
        normalize(venue, &payload, policy)
    }

    /// Fetch series for several venues concurrently.
    ///
    /// One slow or failing venue does not hold back the others; failures are
    /// logged and the venue is left out of the map, so alignment treats it
    /// as absent.
    pub async fn fetch_all_series(
        &self,
        requests: &[(VenueKey, String)],
        limit: usize,
        policy: TimestampPolicy,
    ) -> (HashMap<VenueKey, NormalizedSeries>, Vec<MarketDataError>) {
        let fetches = requests.iter().map(|(venue, symbol)| async move {
            self.fetch_series(*venue, symbol, limit, policy).await
        });

        let mut series = HashMap::new();
        let mut failures = Vec::new();
        for result in join_all(fetches).await {
            match result {
                Ok(s) => {
                    series.insert(s.venue(), s);
                }
                Err(e) => {
                    warn!(error = %e, "Venue fetch failed");
                    failures.push(e);
                }
            }
        }
        (series, failures)
    }

    /// Fetch and parse the venue's best bid/ask.
    pub async fn fetch_best_quote(&self, venue: VenueKey, symbol: &str) -> Result<BestQuote> {
        let path = venue.info().ticker_path(symbol);
        let payload = self.fetch_json(venue, &path).await?;
        parse_best_quote(venue, &payload)
    }
}

/// First `MAX_ERROR_BODY` bytes of an error body; read failures leave it short.
async fn error_body_prefix(mut response: reqwest::Response) -> String {
    let mut buf: Vec<u8> = Vec::new();
    while buf.len() < MAX_ERROR_BODY {
        match response.chunk().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    buf.truncate(MAX_ERROR_BODY);
    truncate_utf8(&String::from_utf8_lossy(&buf), MAX_ERROR_BODY).to_string()
}
