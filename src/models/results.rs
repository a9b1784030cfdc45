//! Per-search result rows, travel times and summary statistics

use serde::{Deserialize, Serialize};

use crate::age_group::AgeGroup;
use crate::models::DaycareRecord;

/// Travel durations from the origin to one facility, as reported by the
/// distance matrix service ("17 mins", "1 hour 5 mins"). A slot is `None`
/// when the service had no route for that mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelTimes {
    pub walk: Option<String>,
    pub transit: Option<String>,
    pub drive: Option<String>,
}

/// One facility matched by a search, ordered by ascending distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyResult {
    pub record: DaycareRecord,
    /// Great-circle distance from the origin in kilometers, un-rounded.
    /// Radius comparison and ordering use this value; presentation rounds.
    pub distance_km: f64,
    /// The age group the search was for
    pub age_group: AgeGroup,
    /// Spaces at this facility for that age group
    pub capacity: u32,
    /// Filled in by the travel-time enrichment step after the search
    pub travel: Option<TravelTimes>,
}

impl NearbyResult {
    /// Distance rounded for display
    #[must_use]
    pub fn rounded_distance_km(&self) -> f64 {
        (self.distance_km * 100.0).round() / 100.0
    }
}

/// Summary statistics over one result list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Number of facilities matched
    pub total: usize,
    /// Facilities within a 15 minute walk
    pub walking_distance: usize,
    /// Facilities enrolled in CWELCC
    pub cwelcc_count: usize,
    pub cwelcc_percent: u32,
    /// Facilities offering fee subsidy
    pub subsidy_count: usize,
    pub subsidy_percent: u32,
    /// Sum of spaces for the searched age group across matches
    pub total_spaces: u32,
}
