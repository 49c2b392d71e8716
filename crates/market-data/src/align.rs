//! Alignment of per-venue series onto a shared day axis

use common::VenueKey;
use serde::Serialize;
use std::collections::HashMap;

use crate::normalize::{NormalizedPoint, NormalizedSeries};
use crate::tick::{DayAxis, DayTick};

/// One venue's points, exactly one per axis tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedVenue {
    pub venue: VenueKey,
    pub points: Vec<NormalizedPoint>,
}

/// Normalized series re-indexed onto a common [`DayAxis`].
///
/// Every venue's tick sequence equals the axis, in order. Missing days are
/// present as `None`; no value is interpolated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSeries {
    axis: DayAxis,
    venues: Vec<AlignedVenue>,
}

impl AlignedSeries {
    pub fn axis(&self) -> &DayAxis {
        &self.axis
    }

    /// Venues in request order
    pub fn venues(&self) -> impl Iterator<Item = VenueKey> + '_ {
        self.venues.iter().map(|v| v.venue)
    }

    pub fn get(&self, venue: VenueKey) -> Option<&[NormalizedPoint]> {
        self.venues
            .iter()
            .find(|v| v.venue == venue)
            .map(|v| v.points.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlignedVenue> {
        self.venues.iter()
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }
}

/// Align `series` for the requested `venues` onto `axis`.
///
/// A requested venue with no series is absent across the whole axis.
/// Repeated venues in the request are aligned once.
pub fn align(
    venues: &[VenueKey],
    axis: &DayAxis,
    series: &HashMap<VenueKey, NormalizedSeries>,
) -> AlignedSeries {
    let mut aligned: Vec<AlignedVenue> = Vec::with_capacity(venues.len());

    for &venue in venues {
        if aligned.iter().any(|v| v.venue == venue) {
            continue;
        }

        let lookup: HashMap<DayTick, Option<f64>> = series
            .get(&venue)
            .map(|s| s.points().iter().map(|p| (p.tick, p.price)).collect())
            .unwrap_or_default();

        let points = axis
            .iter()
            .map(|tick| NormalizedPoint::new(tick, lookup.get(&tick).copied().flatten()))
            .collect();

        aligned.push(AlignedVenue { venue, points });
    }

    AlignedSeries {
        axis: axis.clone(),
        venues: aligned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> DayTick {
        DayTick::EPOCH.add_days(19_000 + n)
    }

    fn series(venue: VenueKey, points: &[(i64, Option<f64>)]) -> NormalizedSeries {
        NormalizedSeries::from_points(
            venue,
            points
                .iter()
                .map(|&(d, p)| NormalizedPoint::new(day(d), p))
                .collect(),
        )
    }

    #[test]
    fn test_every_venue_matches_axis() {
        let axis = DayAxis::new(day(0), day(9));
        let mut input = HashMap::new();
        input.insert(
            VenueKey::Binance,
            series(VenueKey::Binance, &[(0, Some(1.0)), (5, Some(2.0)), (20, Some(9.0))]),
        );
        input.insert(VenueKey::Okx, series(VenueKey::Okx, &[(-3, Some(1.0))]));

        let venues = [VenueKey::Binance, VenueKey::Okx, VenueKey::Kraken];
        let aligned = align(&venues, &axis, &input);

        assert_eq!(aligned.len(), 3);
        for entry in aligned.iter() {
            assert_eq!(entry.points.len(), axis.len());
            let ticks: Vec<DayTick> = entry.points.iter().map(|p| p.tick).collect();
            assert_eq!(ticks.as_slice(), axis.ticks());
        }
    }

    #[test]
    fn test_gaps_are_explicit() {
        let axis = DayAxis::new(day(0), day(3));
        let mut input = HashMap::new();
        input.insert(
            VenueKey::Bybit,
            series(VenueKey::Bybit, &[(0, Some(10.0)), (1, None), (3, Some(0.0))]),
        );

        let aligned = align(&[VenueKey::Bybit], &axis, &input);
        let prices: Vec<Option<f64>> = aligned
            .get(VenueKey::Bybit)
            .unwrap()
            .iter()
            .map(|p| p.price)
            .collect();
        assert_eq!(prices, vec![Some(10.0), None, None, Some(0.0)]);
    }

    #[test]
    fn test_missing_venue_is_absent() {
        let axis = DayAxis::new(day(0), day(2));
        let aligned = align(&[VenueKey::Coinbase], &axis, &HashMap::new());
        let points = aligned.get(VenueKey::Coinbase).unwrap();
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.price.is_none()));
    }

    #[test]
    fn test_request_order_and_duplicates() {
        let axis = DayAxis::new(day(0), day(0));
        let aligned = align(
            &[VenueKey::Kraken, VenueKey::Binance, VenueKey::Kraken],
            &axis,
            &HashMap::new(),
        );
        let venues: Vec<VenueKey> = aligned.venues().collect();
        assert_eq!(venues, vec![VenueKey::Kraken, VenueKey::Binance]);
        assert!(aligned.get(VenueKey::Okx).is_none());
    }

    #[test]
    fn test_empty_axis() {
        let axis = DayAxis::new(day(1), day(0));
        let aligned = align(&[VenueKey::Binance], &axis, &HashMap::new());
        assert_eq!(aligned.get(VenueKey::Binance).unwrap().len(), 0);
    }
}
