//! Most recent day on which a set of venues all have data

use common::VenueKey;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::align::AlignedSeries;
use crate::tick::DayTick;

/// Anchor for an "as of" cross-venue comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommonIndex {
    pub tick: DayTick,
    pub prices: BTreeMap<VenueKey, f64>,
}

/// Scan `aligned` backward for the latest tick where every `required` venue
/// has a price.
///
/// `None` is an expected outcome (not enough overlapping history). An empty
/// `required` list, or a venue missing from `aligned`, also yields `None`.
pub fn find_common_index(aligned: &AlignedSeries, required: &[VenueKey]) -> Option<CommonIndex> {
    let first = *required.first()?;
    let columns = required
        .iter()
        .map(|&venue| aligned.get(venue).map(|points| (venue, points)))
        .collect::<Option<Vec<_>>>()?;
    let canonical = aligned.get(first)?;

    for index in (0..canonical.len()).rev() {
        let prices: Option<BTreeMap<VenueKey, f64>> = columns
            .iter()
            .map(|(venue, points)| points.get(index).and_then(|p| p.price).map(|p| (*venue, p)))
            .collect();
        if let Some(prices) = prices {
            return Some(CommonIndex {
                tick: canonical[index].tick,
                prices,
            });
        }
    }

    None
}
