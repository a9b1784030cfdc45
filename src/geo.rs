//! Great-circle distance helpers
//!
//! Distances use the haversine formula over a mean Earth radius of 6371 km,
//! which is plenty accurate at neighbourhood scale.

use haversine::{Location as HaversineLocation, Units, distance};

use crate::Result;
use crate::error::CareFinderError;

/// Great-circle distance in kilometers between two coordinate pairs
#[must_use]
pub fn haversine_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let from = HaversineLocation {
        latitude: lat1,
        longitude: lon1,
    };
    let to = HaversineLocation {
        latitude: lat2,
        longitude: lon2,
    };
    distance(from, to, Units::Kilometers)
}

/// Check that a coordinate pair lies within WGS84 bounds
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(CareFinderError::invalid_input(format!(
            "latitude {latitude} is out of range [-90, 90]"
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(CareFinderError::invalid_input(format!(
            "longitude {longitude} is out of range [-180, 180]"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points_have_zero_distance() {
        let d = haversine_distance_km(43.6532, -79.3832, 43.6532, -79.3832);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = haversine_distance_km(43.6532, -79.3832, 43.7417, -79.3733);
        let b = haversine_distance_km(43.7417, -79.3733, 43.6532, -79.3832);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_known_distance_city_hall_to_eglinton() {
        // Toronto City Hall to Yonge & Eglinton is just under 10 km
        let d = haversine_distance_km(43.6532, -79.3832, 43.7417, -79.3989);
        assert!(d > 9.0 && d < 11.0, "unexpected distance {d}");
    }

    #[test]
    fn test_antipodal_points() {
        // Half the Earth's mean circumference, no numerical blowup
        let d = haversine_distance_km(0.0, 0.0, 0.0, 180.0);
        assert!((d - 20_015.0).abs() < 25.0, "unexpected distance {d}");
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(validate_coordinates(43.65, -79.38).is_ok());
        assert!(validate_coordinates(90.0, 180.0).is_ok());
        assert!(validate_coordinates(-90.0, -180.0).is_ok());
        assert!(validate_coordinates(90.1, 0.0).is_err());
        assert!(validate_coordinates(0.0, -180.1).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }
}
