//! Address geocoding via the Google Geocoding API
//!
//! Only precise, street-level matches inside Toronto are accepted; the
//! dataset covers Toronto facilities, so a vague or out-of-town match would
//! just produce an empty or misleading search. "No acceptable match" is a
//! normal outcome (`Ok(None)`), distinct from a transport or quota failure.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::cache::{Cache, jittered_ttl};
use crate::config::CareFinderConfig;
use crate::error::CareFinderError;
use crate::models::OriginPoint;
use crate::{API_CLIENT, Result};

/// Client for the Google Geocoding API
pub struct GeocodingClient {
    api_key: String,
    base_url: String,
    timeout: Duration,
    cache: Arc<Cache>,
    ttl_hours: u32,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: LatLng,
    #[serde(default)]
    location_type: String,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    #[serde(default)]
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl GeocodingClient {
    /// Create a client from configuration; the Maps API key is required
    pub fn new(config: &CareFinderConfig, cache: Arc<Cache>) -> Result<Self> {
        let api_key = config
            .maps
            .api_key
            .clone()
            .ok_or_else(|| CareFinderError::config("Missing Google Maps API key"))?;

        Ok(Self {
            api_key,
            base_url: config.maps.base_url.clone(),
            timeout: Duration::from_secs(config.maps.timeout_seconds.into()),
            cache,
            ttl_hours: config.cache.geocode_ttl_hours,
        })
    }

    /// Geocode a user address to an origin point.
    ///
    /// Returns `Ok(None)` when no acceptable match exists.
    #[instrument(skip(self))]
    pub async fn geocode_address(&self, address: &str) -> Result<Option<OriginPoint>> {
        let query = normalize_address(address);
        let key = format!("geocode:{}", query.to_lowercase());

        if let Some((lat, lon)) = self.cache.get::<(f64, f64)>(&key).await? {
            debug!("Geocode cache hit for {}", query);
            return Ok(Some(OriginPoint::new(lat, lon, address.to_string())));
        }

        let Some((lat, lon)) = self.geocode_call(&query).await? else {
            return Ok(None);
        };

        self.cache
            .put(&key, (lat, lon), jittered_ttl(self.ttl_hours))
            .await?;

        Ok(Some(OriginPoint::new(lat, lon, address.to_string())))
    }

    async fn geocode_call(&self, query: &str) -> Result<Option<(f64, f64)>> {
        debug!("Calling the geocoding API");
        let url = format!(
            "{}/geocode/json?address={}&key={}",
            self.base_url,
            urlencoding::encode(query),
            self.api_key
        );

        let response = API_CLIENT
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| CareFinderError::api(format!("geocoding request failed: {e}")))?;
        let response: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| CareFinderError::api(format!("malformed geocoding response: {e}")))?;

        match response.status.as_str() {
            "OK" => Ok(response.results.iter().find_map(accept_result)),
            "ZERO_RESULTS" => Ok(None),
            status => Err(CareFinderError::api(format!(
                "geocoding API returned status {status}"
            ))),
        }
    }
}

/// Append the city when the user typed a bare street address
fn normalize_address(address: &str) -> String {
    if address.to_lowercase().contains("toronto") {
        address.to_string()
    } else {
        format!("{address}, Toronto, Ontario, Canada")
    }
}

/// Keep only precise street-level matches inside Toronto.
///
/// ROOFTOP is an exact address, RANGE_INTERPOLATED an interpolated street
/// number; everything vaguer (city centroids, postal prefixes) is rejected.
fn accept_result(result: &GeocodeResult) -> Option<(f64, f64)> {
    if !matches!(
        result.geometry.location_type.as_str(),
        "ROOFTOP" | "RANGE_INTERPOLATED"
    ) {
        return None;
    }

    let mut is_toronto = false;
    let mut has_street = false;
    for component in &result.address_components {
        let types = &component.types;
        if types.iter().any(|t| t == "locality")
            && component.long_name.to_lowercase().contains("toronto")
        {
            is_toronto = true;
        }
        if types.iter().any(|t| t == "street_number" || t == "route") {
            has_street = true;
        }
    }

    if is_toronto && has_street {
        Some((result.geometry.location.lat, result.geometry.location.lng))
    } else {
        None
    }
}
