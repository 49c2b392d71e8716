//! Venue → upstream base URL table

use common::VenueKey;
use config::ProxyConfig;
use std::collections::BTreeMap;
use url::Url;

use crate::error::SetupError;

#[derive(Debug, Clone)]
pub struct Upstream {
    pub base_url: Url,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct UpstreamTable {
    upstreams: BTreeMap<VenueKey, Upstream>,
}

impl UpstreamTable {
    /// One entry per known venue; config overrides the registry default.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, SetupError> {
        let mut upstreams = BTreeMap::new();
        for venue in VenueKey::ALL {
            let raw = config.base_url(venue);
            let base_url = Url::parse(&raw)
                .map_err(|source| SetupError::InvalidBaseUrl { venue, source })?;
            upstreams.insert(
                venue,
                Upstream {
                    base_url,
                    enabled: config.is_enabled(venue),
                },
            );
        }
        Ok(Self { upstreams })
    }

    pub fn get(&self, venue: VenueKey) -> Option<&Upstream> {
        self.upstreams.get(&venue)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VenueKey, &Upstream)> {
        self.upstreams.iter().map(|(k, v)| (*k, v))
    }
}

impl Upstream {
    /// Append `path` and the untouched query string to the base URL.
    ///
    /// The path is joined textually so that a base URL with its own path
    /// prefix keeps it.
    pub fn target(&self, path: &str, query: Option<&str>) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        match query {
            Some(q) if !q.is_empty() => format!("{}/{}?{}", base, path, q),
            _ => format!("{}/{}", base, path),
        }
    }
}
