//! Snapshot download from the Toronto Open Data portal
//!
//! The licensed child care dataset lives in a CKAN instance. A package
//! lookup finds the datastore-backed resource, whose dump endpoint returns
//! the full dataset as CSV. Snapshots are written with a date-stamped name
//! so the catalog loader can pick the newest one.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::CareFinderError;
use crate::{API_CLIENT, Result, age_group};

const BASE_URL: &str = "https://ckan0.cf.opendata.inter.prod-toronto.ca";
const PACKAGE_ID: &str = "licensed-child-care-centres";

#[derive(Debug, Deserialize)]
struct PackageResponse {
    result: PackageResult,
}

#[derive(Debug, Deserialize)]
struct PackageResult {
    #[serde(default)]
    resources: Vec<PackageResource>,
}

#[derive(Debug, Deserialize)]
struct PackageResource {
    id: String,
    #[serde(default)]
    datastore_active: bool,
}

/// Client for the Toronto Open Data CKAN API
pub struct OpenDataClient {
    base_url: String,
}

impl OpenDataClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
        }
    }

    /// Download the current dataset into the data directory and return the
    /// path of the written snapshot.
    #[instrument(skip(self))]
    pub async fn fetch_snapshot(&self, data_dir: &Path) -> Result<PathBuf> {
        let url = format!(
            "{}/api/3/action/package_show?id={}",
            self.base_url, PACKAGE_ID
        );
        let response = API_CLIENT
            .get(url)
            .send()
            .await
            .map_err(|e| CareFinderError::api(format!("package lookup failed: {e}")))?;
        let package: PackageResponse = response
            .json()
            .await
            .map_err(|e| CareFinderError::api(format!("malformed package response: {e}")))?;

        let resource = package
            .result
            .resources
            .iter()
            .find(|resource| resource.datastore_active)
            .ok_or_else(|| {
                CareFinderError::api(format!("package {PACKAGE_ID} has no datastore resource"))
            })?;

        let dump_url = format!("{}/datastore/dump/{}", self.base_url, resource.id);
        let csv = API_CLIENT
            .get(dump_url)
            .send()
            .await
            .map_err(|e| CareFinderError::api(format!("datastore dump failed: {e}")))?
            .text()
            .await
            .map_err(|e| CareFinderError::api(format!("datastore dump read failed: {e}")))?;

        if csv.trim().is_empty() {
            return Err(CareFinderError::api("datastore dump was empty"));
        }

        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(snapshot_filename(age_group::today_in_toronto()));
        std::fs::write(&path, csv)?;

        info!("Saved daycare snapshot to {}", path.display());
        Ok(path)
    }
}

impl Default for OpenDataClient {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot_filename(date: chrono::NaiveDate) -> String {
    format!("daycare_list_{}.csv", date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_filename_sorts_by_date() {
        let older = snapshot_filename("2026-07-01".parse().unwrap());
        let newer = snapshot_filename("2026-08-07".parse().unwrap());
        assert_eq!(newer, "daycare_list_20260807.csv");
        assert!(newer > older);
    }

    #[test]
    fn test_package_response_parsing() {
        let response: PackageResponse = serde_json::from_str(
            r#"{
                "success": true,
                "result": {
                    "resources": [
                        {"id": "abc-123", "datastore_active": false},
                        {"id": "def-456", "datastore_active": true}
                    ]
                }
            }"#,
        )
        .unwrap();

        let active = response
            .result
            .resources
            .iter()
            .find(|r| r.datastore_active)
            .unwrap();
        assert_eq!(active.id, "def-456");
    }
}
