//! In-memory catalog of licensed child care centres
//!
//! The catalog is loaded once from the newest CSV snapshot in the data
//! directory and never mutated; a reload swaps the whole record set behind
//! an `Arc`, so queries running against the old snapshot keep a consistent
//! view until they finish.
//!
//! A snapshot is rejected wholesale when any required field fails to parse.
//! Optional fields degrade: empty capacity columns count as 0, absent flags
//! as false.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::Deserialize;
use tracing::{debug, info};

use crate::Result;
use crate::age_group::AgeGroup;
use crate::error::CareFinderError;
use crate::geo;
use crate::models::{AgeGroupSpaces, DaycareRecord};

/// One row of the Toronto Open Data licensed child care CSV, untyped.
///
/// Every column is optional at this stage; `to_record` decides which ones
/// are actually required.
#[derive(Debug, Deserialize)]
struct SnapshotRow {
    #[serde(rename = "LOC_ID", default)]
    loc_id: Option<String>,
    #[serde(rename = "LOC_NAME", default)]
    loc_name: Option<String>,
    #[serde(rename = "ADDRESS", default)]
    address: Option<String>,
    #[serde(rename = "PCODE", default)]
    pcode: Option<String>,
    #[serde(rename = "PHONE", default)]
    phone: Option<String>,
    #[serde(rename = "IGSPACE", default)]
    igspace: Option<String>,
    #[serde(rename = "TGSPACE", default)]
    tgspace: Option<String>,
    #[serde(rename = "PGSPACE", default)]
    pgspace: Option<String>,
    #[serde(rename = "KGSPACE", default)]
    kgspace: Option<String>,
    #[serde(rename = "SGSPACE", default)]
    sgspace: Option<String>,
    #[serde(rename = "TOTSPACE", default)]
    totspace: Option<String>,
    #[serde(rename = "subsidy", default)]
    subsidy: Option<String>,
    #[serde(rename = "cwelcc_flag", default)]
    cwelcc_flag: Option<String>,
    #[serde(rename = "geometry", default)]
    geometry: Option<String>,
}

/// GeoJSON geometry as stored in the snapshot's `geometry` column
#[derive(Debug, Deserialize)]
struct GeoJsonPoint {
    #[serde(rename = "type")]
    kind: String,
    /// GeoJSON order: [longitude, latitude]
    coordinates: Vec<f64>,
}

impl SnapshotRow {
    /// Convert the raw row into a validated record
    fn to_record(&self) -> Result<DaycareRecord> {
        let id = required_field(&self.loc_id, "LOC_ID")?;
        let name = required_field(&self.loc_name, "LOC_NAME")?;
        let address = required_field(&self.address, "ADDRESS")?;

        let (latitude, longitude) = self.parse_geometry(&id)?;
        geo::validate_coordinates(latitude, longitude)?;

        let spaces = AgeGroupSpaces {
            infant: parse_spaces(&self.igspace, "IGSPACE", &id)?,
            toddler: parse_spaces(&self.tgspace, "TGSPACE", &id)?,
            preschool: parse_spaces(&self.pgspace, "PGSPACE", &id)?,
            kindergarten: parse_spaces(&self.kgspace, "KGSPACE", &id)?,
            school_age: parse_spaces(&self.sgspace, "SGSPACE", &id)?,
        };
        let total_spaces = parse_spaces(&self.totspace, "TOTSPACE", &id)?;

        Ok(DaycareRecord {
            id,
            name,
            address,
            postal_code: optional_field(&self.pcode),
            phone: optional_field(&self.phone),
            latitude,
            longitude,
            spaces,
            total_spaces,
            subsidy: parse_flag(&self.subsidy),
            cwelcc: parse_flag(&self.cwelcc_flag),
        })
    }

    /// Extract (latitude, longitude) from the GeoJSON `geometry` column
    fn parse_geometry(&self, id: &str) -> Result<(f64, f64)> {
        let raw = self.geometry.as_deref().map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Err(CareFinderError::data_unavailable(format!(
                "record {id}: missing geometry"
            )));
        }

        let point: GeoJsonPoint = serde_json::from_str(raw).map_err(|e| {
            CareFinderError::data_unavailable(format!("record {id}: malformed geometry: {e}"))
        })?;

        if point.kind != "Point" || point.coordinates.len() < 2 {
            return Err(CareFinderError::data_unavailable(format!(
                "record {id}: geometry is not a point"
            )));
        }

        // GeoJSON is [lon, lat]
        Ok((point.coordinates[1], point.coordinates[0]))
    }
}

fn required_field(value: &Option<String>, column: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CareFinderError::data_unavailable(format!(
            "missing required column {column}"
        ))),
    }
}

fn optional_field(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse a capacity column. Empty cells mean zero; anything else must be a
/// non-negative whole number (the CKAN dump sometimes renders them as
/// "25.0").
fn parse_spaces(value: &Option<String>, column: &str, id: &str) -> Result<u32> {
    let raw = value.as_deref().map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(0);
    }

    if let Ok(count) = raw.parse::<u32>() {
        return Ok(count);
    }

    match raw.parse::<f64>() {
        Ok(count) if count >= 0.0 && count.fract() == 0.0 && count <= f64::from(u32::MAX) => {
            Ok(count as u32)
        }
        _ => Err(CareFinderError::data_unavailable(format!(
            "record {id}: {column} value '{raw}' is not a space count"
        ))),
    }
}

/// "Y" means yes; anything else, including an absent column, means no
fn parse_flag(value: &Option<String>) -> bool {
    matches!(value.as_deref().map(str::trim), Some("Y"))
}

/// The in-memory record set, swapped atomically on reload
pub struct DaycareCatalog {
    records: RwLock<Arc<Vec<DaycareRecord>>>,
}

impl DaycareCatalog {
    /// Create an empty catalog; queries against it report data unavailable
    #[must_use]
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    /// Build a catalog directly from records (tests, pre-parsed data)
    #[must_use]
    pub fn from_records(records: Vec<DaycareRecord>) -> Self {
        Self {
            records: RwLock::new(Arc::new(records)),
        }
    }

    /// Load a catalog from the newest snapshot in the data directory
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let catalog = Self::new();
        catalog.reload_from_dir(dir)?;
        Ok(catalog)
    }

    /// Re-read the newest snapshot and swap it in atomically.
    ///
    /// On any parse failure the current record set stays in place.
    pub fn reload_from_dir(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let path = latest_snapshot_path(dir.as_ref())?;
        debug!("Loading daycare snapshot from {}", path.display());

        let file = std::fs::File::open(&path)?;
        let records = parse_snapshot(file)?;
        let count = records.len();

        self.replace(records);
        info!(
            "Loaded {} daycare records from {}",
            count,
            path.display()
        );
        Ok(count)
    }

    /// Swap in a new record set. In-flight queries keep the snapshot they
    /// already hold.
    pub fn replace(&self, records: Vec<DaycareRecord>) {
        let mut guard = self
            .records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(records);
    }

    /// The current record set. Cloning the `Arc` pins a consistent snapshot
    /// for the duration of a query.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<DaycareRecord>> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Records with at least one space for the given age group
    #[must_use]
    pub fn with_capacity_for(&self, group: AgeGroup) -> Vec<DaycareRecord> {
        self.snapshot()
            .iter()
            .filter(|record| record.serves(group))
            .cloned()
            .collect()
    }
}

impl Default for DaycareCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a whole CSV snapshot. Any bad required field rejects the snapshot.
pub fn parse_snapshot<R: Read>(reader: R) -> Result<Vec<DaycareRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<SnapshotRow>() {
        let row = row.map_err(|e| {
            CareFinderError::data_unavailable(format!("malformed snapshot row: {e}"))
        })?;
        records.push(row.to_record()?);
    }

    Ok(records)
}

/// Newest snapshot in the directory. Snapshots carry date-stamped names
/// (`daycare_list_YYYYMMDD.csv`), so the lexicographically greatest file
/// name is the most recent.
fn latest_snapshot_path(dir: &Path) -> Result<PathBuf> {
    let mut csv_files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .collect();

    csv_files.sort();
    csv_files.pop().ok_or_else(|| {
        CareFinderError::data_unavailable(format!(
            "no daycare snapshot found in {}",
            dir.display()
        ))
    })
}
