//! Legacy upstream path shapes that the proxy refuses with 410
//!
//! The table is built once at startup and only read afterwards. It is
//! consulted before the outbound request is built, so a retired path never
//! costs a network round-trip.

use common::VenueKey;
use regex::Regex;
use std::collections::HashMap;

use crate::error::SetupError;

/// Retired path prefixes per venue, relative to the venue segment.
const BUILTIN_RULES: &[(VenueKey, &[&str])] = &[
    (VenueKey::Binance, &[r"^wapi/", r"^api/v1/"]),
    (VenueKey::Okx, &[r"^api/v1/", r"^api/v3/"]),
    (
        VenueKey::Bybit,
        &[
            r"^market/",
            r"^v2/",
            r"^spot/v1/",
            r"^spot/v3/",
            r"^derivatives/v3/",
            r"^contract/v3/",
            r"^public/linear/",
            r"^private/linear/",
        ],
    ),
    (VenueKey::Coinbase, &[r"^v2/prices/"]),
];

#[derive(Debug, Clone, Default)]
pub struct DeprecationTable {
    rules: HashMap<VenueKey, Vec<Regex>>,
}

impl DeprecationTable {
    /// The built-in legacy rules.
    pub fn builtin() -> Result<Self, SetupError> {
        let mut table = Self::default();
        for (venue, patterns) in BUILTIN_RULES {
            table.extend(*venue, patterns.iter().copied())?;
        }
        Ok(table)
    }

    /// Add patterns for `venue`.
    pub fn extend<'a>(
        &mut self,
        venue: VenueKey,
        patterns: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), SetupError> {
        for pattern in patterns {
            let regex = Regex::new(pattern).map_err(|source| SetupError::InvalidPattern {
                venue,
                pattern: pattern.to_string(),
                source,
            })?;
            self.rules.entry(venue).or_default().push(regex);
        }
        Ok(())
    }

    /// The first pattern matching `path` (no leading slash, no query).
    pub fn check(&self, venue: VenueKey, path: &str) -> Option<&str> {
        self.rules
            .get(&venue)?
            .iter()
            .find(|rule| rule.is_match(path))
            .map(Regex::as_str)
    }

    pub fn rule_count(&self, venue: VenueKey) -> usize {
        self.rules.get(&venue).map_or(0, Vec::len)
    }
}
