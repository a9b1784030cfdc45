//! Nearby daycare search
//!
//! Filters the catalog to facilities within a radius of the origin that
//! have spaces for the child's age group, ordered closest-first. This pass
//! is pure computation over the in-memory snapshot; geocoding happens
//! before it and travel-time enrichment strictly after.

use chrono::NaiveDate;
use tracing::debug;

use crate::Result;
use crate::age_group;
use crate::catalog::DaycareCatalog;
use crate::error::CareFinderError;
use crate::geo;
use crate::models::{NearbyResult, OriginPoint, SearchStats};
use crate::travel_time::parse_duration_minutes;

/// Walk durations up to this many minutes count as "walking distance"
const WALKING_DISTANCE_MINUTES: u32 = 15;

/// Find facilities near the origin with spaces for the child's age group,
/// using today's date in Toronto as the age reference.
pub fn find_nearby(
    origin: &OriginPoint,
    birthday: NaiveDate,
    radius_km: f64,
    catalog: &DaycareCatalog,
) -> Result<Vec<NearbyResult>> {
    find_nearby_as_of(origin, birthday, radius_km, catalog, age_group::today_in_toronto())
}

/// Same search with an explicit age reference date. Deterministic for a
/// fixed catalog, origin, birthday, radius and reference date.
pub fn find_nearby_as_of(
    origin: &OriginPoint,
    birthday: NaiveDate,
    radius_km: f64,
    catalog: &DaycareCatalog,
    reference: NaiveDate,
) -> Result<Vec<NearbyResult>> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(CareFinderError::invalid_input(format!(
            "search radius must be positive, got {radius_km}"
        )));
    }
    origin.validate()?;

    let snapshot = catalog.snapshot();
    if snapshot.is_empty() {
        return Err(CareFinderError::data_unavailable(
            "the daycare catalog is empty",
        ));
    }

    let group = age_group::map_age_group(birthday, reference)?;
    debug!(
        "Searching {} records within {}km of {} for {}",
        snapshot.len(),
        radius_km,
        origin.format_coordinates(),
        group.label()
    );

    let mut results: Vec<NearbyResult> = Vec::new();
    for record in snapshot.iter() {
        let distance_km = geo::haversine_distance_km(
            origin.latitude,
            origin.longitude,
            record.latitude,
            record.longitude,
        );
        if distance_km > radius_km {
            continue;
        }

        let capacity = record.capacity_for(group);
        if capacity == 0 {
            continue;
        }

        results.push(NearbyResult {
            record: record.clone(),
            distance_km,
            age_group: group,
            capacity,
            travel: None,
        });
    }

    // Closest first; ties ordered by record id for a stable result sequence
    results.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.record.id.cmp(&b.record.id))
    });

    debug!("Found {} matching facilities", results.len());
    Ok(results)
}

/// Summary statistics over one result list
#[must_use]
pub fn search_stats(results: &[NearbyResult]) -> SearchStats {
    if results.is_empty() {
        return SearchStats::default();
    }

    let total = results.len();

    let walking_distance = results
        .iter()
        .filter_map(|r| r.travel.as_ref())
        .filter_map(|travel| travel.walk.as_deref())
        .filter_map(parse_duration_minutes)
        .filter(|minutes| *minutes <= WALKING_DISTANCE_MINUTES)
        .count();

    let cwelcc_count = results.iter().filter(|r| r.record.cwelcc).count();
    let subsidy_count = results.iter().filter(|r| r.record.subsidy).count();
    let total_spaces = results.iter().map(|r| r.capacity).sum();

    SearchStats {
        total,
        walking_distance,
        cwelcc_count,
        cwelcc_percent: percent(cwelcc_count, total),
        subsidy_count,
        subsidy_percent: percent(subsidy_count, total),
        total_spaces,
    }
}

fn percent(count: usize, total: usize) -> u32 {
    (count as f64 / total as f64 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age_group::AgeGroup;
    use crate::models::{AgeGroupSpaces, DaycareRecord, TravelTimes};

    const REFERENCE: &str = "2026-08-01";

    fn reference() -> NaiveDate {
        REFERENCE.parse().unwrap()
    }

    /// Birthday that makes the child a toddler (24 months) on the reference date
    fn toddler_birthday() -> NaiveDate {
        "2024-08-01".parse().unwrap()
    }

    /// Birthday that makes the child an infant (6 months) on the reference date
    fn infant_birthday() -> NaiveDate {
        "2026-02-01".parse().unwrap()
    }

    fn downtown_origin() -> OriginPoint {
        OriginPoint::new(43.6532, -79.3832, "100 Queen St W".to_string())
    }

    fn record(id: &str, lat: f64, lon: f64, spaces: AgeGroupSpaces) -> DaycareRecord {
        DaycareRecord {
            id: id.to_string(),
            name: format!("Centre {id}"),
            address: "1 Main St".to_string(),
            postal_code: None,
            phone: None,
            latitude: lat,
            longitude: lon,
            spaces,
            total_spaces: 30,
            subsidy: false,
            cwelcc: false,
        }
    }

    fn toddler_spaces(count: u32) -> AgeGroupSpaces {
        AgeGroupSpaces {
            toddler: count,
            ..AgeGroupSpaces::default()
        }
    }

    #[test]
    fn test_colocated_facility_with_capacity_matches() {
        let catalog = DaycareCatalog::from_records(vec![record(
            "1001",
            43.6532,
            -79.3832,
            AgeGroupSpaces {
                toddler: 5,
                infant: 0,
                ..AgeGroupSpaces::default()
            },
        )]);

        let results = find_nearby_as_of(
            &downtown_origin(),
            toddler_birthday(),
            5.0,
            &catalog,
            reference(),
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].distance_km, 0.0);
        assert_eq!(results[0].capacity, 5);
        assert_eq!(results[0].age_group, AgeGroup::Toddler);
    }

    #[test]
    fn test_zero_capacity_excludes_even_at_distance_zero() {
        let catalog = DaycareCatalog::from_records(vec![record(
            "1001",
            43.6532,
            -79.3832,
            toddler_spaces(5),
        )]);

        let results = find_nearby_as_of(
            &downtown_origin(),
            infant_birthday(),
            5.0,
            &catalog,
            reference(),
        )
        .unwrap();

        assert!(results.is_empty());
    }

    #[test]
    fn test_radius_boundary_inclusion() {
        // Roughly 10 km north of the downtown origin
        let catalog = DaycareCatalog::from_records(vec![record(
            "1001",
            43.7432,
            -79.3832,
            toddler_spaces(5),
        )]);
        let origin = downtown_origin();

        let near = find_nearby_as_of(&origin, toddler_birthday(), 5.0, &catalog, reference())
            .unwrap();
        assert!(near.is_empty());

        let far = find_nearby_as_of(&origin, toddler_birthday(), 15.0, &catalog, reference())
            .unwrap();
        assert_eq!(far.len(), 1);
        assert!(far[0].distance_km > 9.0 && far[0].distance_km < 11.0);
    }

    #[test]
    fn test_results_sorted_by_distance_with_id_tiebreak() {
        let catalog = DaycareCatalog::from_records(vec![
            record("3003", 43.6632, -79.3832, toddler_spaces(1)),
            record("1001", 43.6532, -79.3832, toddler_spaces(1)),
            // Same coordinates as 3003, tie broken by id
            record("2002", 43.6632, -79.3832, toddler_spaces(1)),
        ]);

        let results = find_nearby_as_of(
            &downtown_origin(),
            toddler_birthday(),
            5.0,
            &catalog,
            reference(),
        )
        .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, vec!["1001", "2002", "3003"]);

        for pair in results.windows(2) {
            assert!(pair[0].distance_km <= pair[1].distance_km);
        }
    }

    #[test]
    fn test_no_result_outside_radius_or_without_capacity() {
        let catalog = DaycareCatalog::from_records(vec![
            record("1001", 43.6532, -79.3832, toddler_spaces(4)),
            record("1002", 43.6600, -79.3900, AgeGroupSpaces::default()),
            record("1003", 44.5, -79.3832, toddler_spaces(9)),
        ]);

        let results = find_nearby_as_of(
            &downtown_origin(),
            toddler_birthday(),
            5.0,
            &catalog,
            reference(),
        )
        .unwrap();

        for result in &results {
            assert!(result.distance_km <= 5.0);
            assert!(result.capacity > 0);
        }
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.id, "1001");
    }

    #[test]
    fn test_zero_radius_is_invalid() {
        let catalog =
            DaycareCatalog::from_records(vec![record("1001", 43.6532, -79.3832, toddler_spaces(5))]);

        let result = find_nearby_as_of(
            &downtown_origin(),
            toddler_birthday(),
            0.0,
            &catalog,
            reference(),
        );
        assert!(matches!(result, Err(CareFinderError::InvalidInput { .. })));

        let result = find_nearby_as_of(
            &downtown_origin(),
            toddler_birthday(),
            -2.0,
            &catalog,
            reference(),
        );
        assert!(matches!(result, Err(CareFinderError::InvalidInput { .. })));
    }

    #[test]
    fn test_empty_catalog_is_data_unavailable() {
        let catalog = DaycareCatalog::new();
        let result = find_nearby_as_of(
            &downtown_origin(),
            toddler_birthday(),
            5.0,
            &catalog,
            reference(),
        );
        assert!(matches!(
            result,
            Err(CareFinderError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn test_stats_over_results() {
        let mut subsidized = record("1001", 43.6532, -79.3832, toddler_spaces(5));
        subsidized.subsidy = true;
        let mut cwelcc = record("1002", 43.6540, -79.3840, toddler_spaces(3));
        cwelcc.cwelcc = true;
        let plain = record("1003", 43.6550, -79.3850, toddler_spaces(2));

        let catalog = DaycareCatalog::from_records(vec![subsidized, cwelcc, plain]);
        let mut results = find_nearby_as_of(
            &downtown_origin(),
            toddler_birthday(),
            5.0,
            &catalog,
            reference(),
        )
        .unwrap();

        results[0].travel = Some(TravelTimes {
            walk: Some("12 mins".to_string()),
            transit: Some("8 mins".to_string()),
            drive: Some("4 mins".to_string()),
        });
        results[1].travel = Some(TravelTimes {
            walk: Some("1 hour 5 mins".to_string()),
            transit: None,
            drive: None,
        });

        let stats = search_stats(&results);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.walking_distance, 1);
        assert_eq!(stats.cwelcc_count, 1);
        assert_eq!(stats.cwelcc_percent, 33);
        assert_eq!(stats.subsidy_count, 1);
        assert_eq!(stats.subsidy_percent, 33);
        assert_eq!(stats.total_spaces, 10);
    }

    #[test]
    fn test_stats_empty_results() {
        assert_eq!(search_stats(&[]), SearchStats::default());
    }
}
