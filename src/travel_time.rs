//! Travel time enrichment via the Google Distance Matrix API
//!
//! After a search, each result row is annotated with walking, transit and
//! driving durations from the origin. The matrix service accepts at most 25
//! destinations per call, so lookups are batched; a failed batch degrades to
//! empty slots rather than failing the search. Durations are cached per
//! destination with a jittered week-scale TTL.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::cache::{Cache, jittered_ttl};
use crate::config::CareFinderConfig;
use crate::error::CareFinderError;
use crate::models::{DaycareRecord, NearbyResult, OriginPoint, TravelTimes};
use crate::{API_CLIENT, Result};

/// Distance Matrix service limit on destinations per request
const MAX_DESTINATIONS_PER_CALL: usize = 25;

#[derive(Debug, Clone, Copy)]
enum TravelMode {
    Walking,
    Transit,
    Driving,
}

impl TravelMode {
    fn as_str(self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Transit => "transit",
            TravelMode::Driving => "driving",
        }
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    duration: Option<MatrixDuration>,
}

#[derive(Debug, Deserialize)]
struct MatrixDuration {
    text: String,
}

/// Client for the Google Distance Matrix API
pub struct TravelTimeClient {
    api_key: String,
    base_url: String,
    timeout: Duration,
    cache: Arc<Cache>,
    ttl_hours: u32,
}

impl TravelTimeClient {
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
            ttl_hours: config.cache.travel_ttl_hours,
        })
    }

    /// Fill in the travel-time slots of a result list, keyed by record id.
    ///
    /// Batches of destinations that fail upstream keep empty slots; the
    /// search result itself is never lost over travel times.
    #[instrument(skip(self, results))]
    pub async fn enrich(&self, origin: &OriginPoint, results: &mut [NearbyResult]) -> Result<()> {
        if results.is_empty() {
            return Ok(());
        }

        let mut missing: Vec<usize> = Vec::new();
        for (index, result) in results.iter_mut().enumerate() {
            let key = cache_key(origin, &result.record);
            if let Some(times) = self.cache.get::<TravelTimes>(&key).await? {
                result.travel = Some(times);
            } else {
                missing.push(index);
            }
        }
        debug!(
            "Travel times: {} cached, {} to fetch",
            results.len() - missing.len(),
            missing.len()
        );

        for batch in missing.chunks(MAX_DESTINATIONS_PER_CALL) {
            let coordinates: Vec<(f64, f64)> = batch
                .iter()
                .map(|&i| (results[i].record.latitude, results[i].record.longitude))
                .collect();

            match self.fetch_batch(origin, &coordinates).await {
                Ok(times) => {
                    for (&index, times) in batch.iter().zip(times) {
                        let key = cache_key(origin, &results[index].record);
                        self.cache
                            .put(&key, times.clone(), jittered_ttl(self.ttl_hours))
                            .await?;
                        results[index].travel = Some(times);
                    }
                }
                Err(e) => {
                    warn!("Travel time batch failed, leaving slots empty: {}", e);
                    for &index in batch {
                        results[index].travel = Some(TravelTimes::default());
                    }
                }
            }
        }

        Ok(())
    }

    /// One batch of destinations across all three modes
    async fn fetch_batch(
        &self,
        origin: &OriginPoint,
        destinations: &[(f64, f64)],
    ) -> Result<Vec<TravelTimes>> {
        let (walk, transit, drive) = futures::try_join!(
            self.mode_durations(origin, destinations, TravelMode::Walking),
            self.mode_durations(origin, destinations, TravelMode::Transit),
            self.mode_durations(origin, destinations, TravelMode::Driving),
        )?;

        let times = walk
            .into_iter()
            .zip(transit)
            .zip(drive)
            .map(|((walk, transit), drive)| TravelTimes {
                walk,
                transit,
                drive,
            })
            .collect();
        Ok(times)
    }

    /// Durations for one mode, aligned with the destination order
    async fn mode_durations(
        &self,
        origin: &OriginPoint,
        destinations: &[(f64, f64)],
        mode: TravelMode,
    ) -> Result<Vec<Option<String>>> {
        debug!("Calling the distance matrix API for {}", mode.as_str());
        let destination_param = destinations
            .iter()
            .map(|(lat, lon)| format!("{lat},{lon}"))
            .collect::<Vec<_>>()
            .join("|");

        let url = format!(
            "{}/distancematrix/json?origins={},{}&destinations={}&mode={}&units=metric&key={}",
            self.base_url,
            origin.latitude,
            origin.longitude,
            urlencoding::encode(&destination_param),
            mode.as_str(),
            self.api_key
        );

        let response = API_CLIENT
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| CareFinderError::api(format!("distance matrix request failed: {e}")))?;
        let response: MatrixResponse = response
            .json()
            .await
            .map_err(|e| CareFinderError::api(format!("malformed distance matrix response: {e}")))?;

        let row = response
            .rows
            .into_iter()
            .next()
            .ok_or_else(|| CareFinderError::api("distance matrix response has no rows"))?;

        if row.elements.len() != destinations.len() {
            return Err(CareFinderError::api(format!(
                "distance matrix returned {} elements for {} destinations",
                row.elements.len(),
                destinations.len()
            )));
        }

        Ok(row
            .elements
            .into_iter()
            .map(|element| {
                if element.status == "OK" {
                    element.duration.map(|d| d.text)
                } else {
                    None
                }
            })
            .collect())
    }
}

fn cache_key(origin: &OriginPoint, record: &DaycareRecord) -> String {
    let (lat, lon) = origin.rounded_coordinates(4);
    format!("travel:{lat:.4}:{lon:.4}:{}", record.id)
}

/// Parse a matrix duration string like "15 mins" or "1 hour 5 mins" into
/// whole minutes. Unparseable or zero durations are `None`.
#[must_use]
pub fn parse_duration_minutes(text: &str) -> Option<u32> {
    let mut remainder = text.trim();
    if remainder.is_empty() || remainder == "N/A" {
        return None;
    }

    let mut total: u32 = 0;
    if let Some((hours_part, rest)) = remainder.split_once("hour") {
        let hours: u32 = hours_part.trim().parse().ok()?;
        total = hours.checked_mul(60)?;
        remainder = rest;
    }

    if let Some((minutes_part, _)) = remainder.split_once("min") {
        // The leftover "s" of "hours" sits in front of the number
        let minutes: u32 = match minutes_part.split_whitespace().last() {
            Some(number) => number.parse().ok()?,
            None => 0,
        };
        total = total.checked_add(minutes)?;
    }

    if total > 0 { Some(total) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("15 mins", Some(15))]
    #[case("1 min", Some(1))]
    #[case("1 hour 5 mins", Some(65))]
    #[case("2 hours 10 mins", Some(130))]
    #[case("1 hour", Some(60))]
    #[case("N/A", None)]
    #[case("", None)]
    #[case("soon", None)]
    fn test_parse_duration_minutes(#[case] text: &str, #[case] expected: Option<u32>) {
        assert_eq!(parse_duration_minutes(text), expected);
    }

    #[test]
    fn test_batching_respects_service_limit() {
        let indexes: Vec<usize> = (0..60).collect();
        let batches: Vec<&[usize]> = indexes.chunks(MAX_DESTINATIONS_PER_CALL).collect();
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() <= 25));
        assert_eq!(batches[2].len(), 10);
    }

    #[test]
    fn test_matrix_element_parsing() {
        let response: MatrixResponse = serde_json::from_str(
            r#"{
                "rows": [{
                    "elements": [
                        {"status": "OK", "duration": {"text": "17 mins", "value": 1020}},
                        {"status": "ZERO_RESULTS"}
                    ]
                }]
            }"#,
        )
        .unwrap();

        let elements = &response.rows[0].elements;
        assert_eq!(elements[0].status, "OK");
        assert_eq!(
            elements[0].duration.as_ref().map(|d| d.text.as_str()),
            Some("17 mins")
        );
        assert!(elements[1].duration.is_none());
    }

    #[test]
    fn test_cache_key_uses_rounded_origin_and_record_id() {
        let origin = OriginPoint::new(43.653_226, -79.383_184, "Test".to_string());
        let record = DaycareRecord {
            id: "1001".to_string(),
            name: "Centre".to_string(),
            address: "1 Main St".to_string(),
            postal_code: None,
            phone: None,
            latitude: 43.66,
            longitude: -79.39,
            spaces: crate::models::AgeGroupSpaces::default(),
            total_spaces: 0,
            subsidy: false,
            cwelcc: false,
        };
        assert_eq!(cache_key(&origin, &record), "travel:43.6532:-79.3832:1001");
    }
}
