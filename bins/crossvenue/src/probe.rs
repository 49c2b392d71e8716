//! `probe`: response-shape checks for each venue through the proxy

use anyhow::{Context, Result};
use common::VenueKey;
use config::CompareConfig;
use futures::future::join_all;
use market_data::{check_candle_rows, BestQuote, CandleRowCheck, ProxyDataClient};
use serde::Serialize;
use server::{ConnectionStatus, HealthClient};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct VenueProbe {
    pub venue: VenueKey,
    pub quote: Option<BestQuote>,
    pub quote_error: Option<String>,
    pub candles: Option<CandleRowCheck>,
    pub candles_error: Option<String>,
}

impl VenueProbe {
    pub fn passed(&self) -> bool {
        self.quote.is_some() && self.candles.is_some()
    }
}

#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub proxy: ConnectionStatus,
    pub venues: Vec<VenueProbe>,
}

impl ProbeReport {
    pub fn passed(&self) -> bool {
        self.proxy.connected && self.venues.iter().all(VenueProbe::passed)
    }
}

pub async fn run_probe(
    compare: &CompareConfig,
    venues: &[VenueKey],
    rows: usize,
    timeout: Duration,
) -> Result<ProbeReport> {
    let health = HealthClient::new(timeout).context("Failed to build health client")?;
    let proxy = health.check_http("proxy", &compare.proxy_url).await;
    if !proxy.connected {
        warn!(address = %proxy.address, error = ?proxy.error, "Proxy health check failed");
    }

    let client = ProxyDataClient::new(&compare.proxy_url, timeout)
        .context("Failed to build HTTP client")?;

    let probes = join_all(
        venues
            .iter()
            .map(|venue| probe_venue(&client, compare, *venue, rows)),
    )
    .await;

    Ok(ProbeReport {
        proxy,
        venues: probes,
    })
}

async fn probe_venue(
    client: &ProxyDataClient,
    compare: &CompareConfig,
    venue: VenueKey,
    rows: usize,
) -> VenueProbe {
    let (quote, quote_error) = match client.fetch_best_quote(venue, &compare.ticker(venue)).await {
        Ok(quote) => (Some(quote), None),
        Err(e) => (None, Some(e.to_string())),
    };

    let path = venue.info().daily_candles_path(&compare.symbol(venue), rows);
    let checked = match client.fetch_json(venue, &path).await {
        Ok(payload) => check_candle_rows(venue, &payload, rows),
        Err(e) => Err(e),
    };
    let (candles, candles_error) = match checked {
        Ok(check) => {
            if !check.is_complete() {
                info!(venue = %venue, rows = check.rows, requested = rows, "Short candle history");
            }
            (Some(check), None)
        }
        Err(e) => (None, Some(e.to_string())),
    };

    VenueProbe {
        venue,
        quote,
        quote_error,
        candles,
        candles_error,
    }
}
