//! `CareFinder` - licensed child care search for Toronto families
//!
//! This library provides the core functionality for finding licensed
//! daycare facilities near an address with open spaces for a child's age
//! group, plus the surrounding service: snapshot ingestion, geocoding,
//! travel-time enrichment and shortlist email delivery.

use std::sync::LazyLock;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

pub mod age_group;
pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod email;
pub mod error;
pub mod finder;
pub mod geo;
pub mod geocoding;
pub mod models;
pub mod opendata;
pub mod travel_time;
pub mod web;

// Re-export core types for public API
pub use age_group::{AgeGroup, age_in_months, map_age_group};
pub use cache::Cache;
pub use catalog::DaycareCatalog;
pub use config::CareFinderConfig;
pub use error::CareFinderError;
pub use finder::{find_nearby, find_nearby_as_of, search_stats};
pub use geo::haversine_distance_km;
pub use geocoding::GeocodingClient;
pub use models::{DaycareRecord, NearbyResult, OriginPoint, SearchStats, TravelTimes};
pub use opendata::OpenDataClient;
pub use travel_time::TravelTimeClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CareFinderError>;

/// Shared HTTP client for all upstream calls; transient failures retry with
/// exponential backoff. Retry policy lives here, outside the search core.
pub static API_CLIENT: LazyLock<ClientWithMiddleware> = LazyLock::new(|| {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
    ClientBuilder::new(reqwest::Client::new())
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
