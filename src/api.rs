//! JSON API handlers
//!
//! The frontend talks to these endpoints; domain types stay internal and
//! wire DTOs are converted at the boundary.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::age_group;
use crate::cache::Cache;
use crate::catalog::DaycareCatalog;
use crate::config::CareFinderConfig;
use crate::email::{self, ShortlistItem};
use crate::error::CareFinderError;
use crate::finder;
use crate::geocoding::GeocodingClient;
use crate::models::{NearbyResult, SearchStats};
use crate::opendata::OpenDataClient;
use crate::travel_time::TravelTimeClient;

/// Shared application state behind every handler
pub struct AppState {
    pub config: CareFinderConfig,
    pub cache: Arc<Cache>,
    pub catalog: DaycareCatalog,
    pub opendata: OpenDataClient,
}

type ApiError = (StatusCode, Json<ErrorBody>);

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub address: String,
    /// Child's date of birth, ISO format (YYYY-MM-DD)
    pub birthday: NaiveDate,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub age_display: String,
    pub age_group_label: String,
    pub results: Vec<ApiDaycare>,
    pub stats: SearchStats,
}

/// One facility row as the frontend renders it
#[derive(Debug, Serialize)]
pub struct ApiDaycare {
    pub id: String,
    pub name: String,
    pub address: String,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
    /// Spaces for the searched age group
    pub capacity: u32,
    pub total_spaces: u32,
    pub infant_spaces: u32,
    pub toddler_spaces: u32,
    pub preschool_spaces: u32,
    pub kindergarten_spaces: u32,
    pub schoolage_spaces: u32,
    pub subsidy: bool,
    pub cwelcc: bool,
    pub walk_time: Option<String>,
    pub transit_time: Option<String>,
    pub drive_time: Option<String>,
}

impl From<&NearbyResult> for ApiDaycare {
    fn from(result: &NearbyResult) -> Self {
        let record = &result.record;
        let travel = result.travel.clone().unwrap_or_default();
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            address: record.address.clone(),
            postal_code: record.postal_code.clone(),
            phone: record.phone.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            distance_km: result.rounded_distance_km(),
            capacity: result.capacity,
            total_spaces: record.total_spaces,
            infant_spaces: record.spaces.infant,
            toddler_spaces: record.spaces.toddler,
            preschool_spaces: record.spaces.preschool,
            kindergarten_spaces: record.spaces.kindergarten,
            schoolage_spaces: record.spaces.school_age,
            subsidy: record.subsidy,
            cwelcc: record.cwelcc,
            walk_time: travel.walk,
            transit_time: travel.transit,
            drive_time: travel.drive,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ReloadRequest {
    /// Download a fresh snapshot from the open data portal before reloading
    #[serde(default)]
    pub fetch: bool,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub records: usize,
}

#[derive(Debug, Deserialize)]
pub struct ShortlistRequest {
    pub to_email: String,
    pub search_address: String,
    pub items: Vec<ShortlistItem>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub records: usize,
    pub version: &'static str,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", post(search))
        .route("/health", get(health))
        .route("/reload", post(reload))
        .route("/shortlist", post(shortlist))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let address = request.address.trim();
    if address.is_empty() {
        return Err(bad_request("Please enter an address"));
    }

    let radius_km = request
        .radius_km
        .unwrap_or(state.config.defaults.search_radius_km);

    let geocoder =
        GeocodingClient::new(&state.config, state.cache.clone()).map_err(error_response)?;
    let origin = geocoder
        .geocode_address(address)
        .await
        .map_err(error_response)?
        .ok_or_else(|| {
            unprocessable("Could not find that address. Please try a more specific address.")
        })?;

    let mut results = finder::find_nearby(&origin, request.birthday, radius_km, &state.catalog)
        .map_err(error_response)?;
    results.truncate(state.config.defaults.max_results as usize);

    // Enrichment failures degrade to empty travel slots, never a lost search
    match TravelTimeClient::new(&state.config, state.cache.clone()) {
        Ok(travel_client) => {
            if let Err(e) = travel_client.enrich(&origin, &mut results).await {
                warn!("Travel time enrichment failed: {}", e);
            }
        }
        Err(e) => warn!("Travel time client unavailable: {}", e),
    }

    let stats = finder::search_stats(&results);

    let age_months = age_group::age_in_months(request.birthday, age_group::today_in_toronto())
        .map_err(error_response)?;
    let age_group_label = age_group::AgeGroup::from_age_months(age_months).label();

    Ok(Json(SearchResponse {
        address: address.to_string(),
        latitude: origin.latitude,
        longitude: origin.longitude,
        radius_km,
        age_display: age_group::format_age(age_months),
        age_group_label: age_group_label.to_string(),
        results: results.iter().map(ApiDaycare::from).collect(),
        stats,
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        records: state.catalog.len(),
        version: crate::VERSION,
    })
}

async fn reload(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReloadRequest>,
) -> Result<Json<ReloadResponse>, ApiError> {
    if request.fetch {
        state
            .opendata
            .fetch_snapshot(std::path::Path::new(&state.config.data.dir))
            .await
            .map_err(error_response)?;
    }

    let records = state
        .catalog
        .reload_from_dir(&state.config.data.dir)
        .map_err(error_response)?;

    Ok(Json(ReloadResponse { records }))
}

async fn shortlist(
    State(_state): State<Arc<AppState>>,
    Json(request): Json<ShortlistRequest>,
) -> Result<StatusCode, ApiError> {
    if request.to_email.trim().is_empty() {
        return Err(bad_request("Please enter an email address"));
    }
    if request.items.is_empty() {
        return Err(bad_request("The shortlist is empty"));
    }

    email::send_shortlist(&request.to_email, &request.search_address, &request.items)
        .await
        .map_err(|e| {
            warn!("Shortlist email failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody {
                    error: "Could not send the shortlist email. Please try again later."
                        .to_string(),
                }),
            )
        })?;

    Ok(StatusCode::OK)
}

fn error_response(error: CareFinderError) -> ApiError {
    let status = match &error {
        CareFinderError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        CareFinderError::DataUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        CareFinderError::Api { .. } => StatusCode::BAD_GATEWAY,
        CareFinderError::Config { .. } | CareFinderError::Cache { .. } | CareFinderError::Io { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorBody {
            error: error.user_message(),
        }),
    )
}

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

fn unprocessable(message: &str) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}
