//! `compare`: aligned daily closes across venues

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::VenueKey;
use config::CompareConfig;
use market_data::{
    align, find_common_index, AlignedSeries, CommonIndex, DayAxis, DayTick, ProxyDataClient,
};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct VenueFailure {
    pub venue: VenueKey,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct CompareReport {
    pub generated_at: DateTime<Utc>,
    pub proxy_url: String,
    pub axis: DayAxis,
    pub aligned: AlignedSeries,
    pub common_index: Option<CommonIndex>,
    pub failures: Vec<VenueFailure>,
}

/// Fetch, normalize and align `venues` over the window ending at `end`.
pub async fn run_compare(
    compare: &CompareConfig,
    venues: &[VenueKey],
    end: DayTick,
    timeout: Duration,
) -> Result<CompareReport> {
    let client = ProxyDataClient::new(&compare.proxy_url, timeout)
        .context("Failed to build HTTP client")?;

    let requests: Vec<(VenueKey, String)> = venues.iter().map(|v| (*v, compare.symbol(*v))).collect();
    info!(
        venues = ?venues,
        window_days = compare.window_days,
        policy = ?compare.timestamp_policy,
        "Fetching daily candles"
    );

    let (series, failures) = client
        .fetch_all_series(&requests, compare.candle_limit, compare.timestamp_policy)
        .await;

    let axis = DayAxis::trailing(end, compare.window_days);
    let aligned = align(venues, &axis, &series);

    // Failed venues are reported separately and do not block the common day.
    let fetched: Vec<VenueKey> = venues
        .iter()
        .copied()
        .filter(|v| series.contains_key(v))
        .collect();
    let common_index = find_common_index(&aligned, &fetched);

    match &common_index {
        Some(index) => info!(tick = %index.tick, "Found common day"),
        None => warn!("No day in the window has data for every requested venue"),
    }

    Ok(CompareReport {
        generated_at: Utc::now(),
        proxy_url: compare.proxy_url.clone(),
        axis,
        aligned,
        common_index,
        failures: failures
            .into_iter()
            .map(|e| VenueFailure {
                venue: e.venue(),
                error: e.to_string(),
            })
            .collect(),
    })
}
