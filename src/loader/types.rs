use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::error::ValidationError;
use crate::loader::normalize::{UNKNOWN_LOCATION, UNKNOWN_MAKE, split_asset_id};

/// One validated odometer reading pair from the input table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRecord {
    /// Source line, for pointing users back at the file.
    pub line: u64,
    pub asset_id: String,
    pub vehicle_id: String,
    pub role: String,
    pub start_km: f64,
    pub end_km: f64,
    pub timestamp: NaiveDateTime,
    pub location: String,
    pub make: String,
    pub age_years: Option<f64>,
}

impl TripRecord {
    /// Builds a record with default metadata. Callers are responsible for
    /// `end_km >= start_km`; the loader enforces it for file input.
    pub fn new(asset_id: &str, start_km: f64, end_km: f64, timestamp: NaiveDateTime) -> Self {
        let (vehicle_id, role) = split_asset_id(asset_id);
        TripRecord {
            line: 0,
            asset_id: asset_id.trim().to_string(),
            vehicle_id,
            role,
            start_km,
            end_km,
            timestamp,
            location: UNKNOWN_LOCATION.to_string(),
            make: UNKNOWN_MAKE.to_string(),
            age_years: None,
        }
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    pub fn with_make(mut self, make: &str) -> Self {
        self.make = make.trim().to_uppercase();
        self
    }

    pub fn with_age(mut self, age_years: f64) -> Self {
        self.age_years = Some(age_years);
        self
    }
}

/// A row that failed validation and was left out of the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    pub line: u64,
    #[serde(serialize_with = "as_display")]
    pub error: ValidationError,
}

fn as_display<S: Serializer>(error: &ValidationError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// The in-memory table produced by the loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadedTable {
    pub records: Vec<TripRecord>,
    pub issues: Vec<RowIssue>,
    /// Non-blank data rows seen, valid or not.
    pub rows_read: usize,
}

impl LoadedTable {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
