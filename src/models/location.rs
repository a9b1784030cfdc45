//! Origin point model for the geocoded search address

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::geo;

/// A geocoded user address
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OriginPoint {
    /// Latitude in decimal degrees (WGS84)
    pub latitude: f64,
    /// Longitude in decimal degrees (WGS84)
    pub longitude: f64,
    /// The address the user searched for
    pub address: String,
}

impl OriginPoint {
    /// Create a new origin point
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, address: String) -> Self {
        Self {
            latitude,
            longitude,
            address,
        }
    }

    /// Check that the coordinates are within WGS84 bounds
    pub fn validate(&self) -> Result<()> {
        geo::validate_coordinates(self.latitude, self.longitude)
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_format_coordinates() {
        let origin = OriginPoint::new(43.6532, -79.3832, "100 Queen St W".to_string());
        assert_eq!(origin.format_coordinates(), "43.6532, -79.3832");
    }

    #[test]
    fn test_origin_rounded_coordinates() {
        let origin = OriginPoint::new(43.653_226, -79.383_184, "Test".to_string());
        let (lat, lon) = origin.rounded_coordinates(2);
        assert_eq!(lat, 43.65);
        assert_eq!(lon, -79.38);
    }

    #[test]
    fn test_origin_validation() {
        let origin = OriginPoint::new(43.6532, -79.3832, "Test".to_string());
        assert!(origin.validate().is_ok());

        let bad = OriginPoint::new(91.0, 0.0, "Test".to_string());
        assert!(bad.validate().is_err());
    }
}
