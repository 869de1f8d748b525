//! Error types shared by the loader, pipeline and export paths.

use std::path::PathBuf;

use thiserror::Error;

/// Shared `Result` alias for the library.
pub type Result<T> = std::result::Result<T, FleetError>;

/// A problem with the shape or content of the input table.
///
/// Row-level variants are collected as [`RowIssue`](crate::loader::RowIssue)s in
/// lenient mode; `MissingColumns` always rejects the whole load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("missing value for {field}")]
    MissingValue { field: &'static str },

    #[error("{field} is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} is negative: {value}")]
    NegativeReading { field: &'static str, value: f64 },

    #[error("end odometer {end_km} is below start odometer {start_km}")]
    EndBeforeStart { start_km: f64, end_km: f64 },

    #[error("unrecognised timestamp: {value:?}")]
    InvalidTimestamp { value: String },

    #[error("column {column} is not valid UTF-8")]
    InvalidEncoding { column: usize },

    #[error("line {line}: {source}")]
    Row {
        line: u64,
        #[source]
        source: Box<ValidationError>,
    },
}

/// Top-level library error.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("no rows to report after {stage}")]
    EmptyData { stage: &'static str },

    #[error("invalid configuration: {details}")]
    Config { details: String },

    #[error("IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV failure: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON failure: {0}")]
    Json(#[from] serde_json::Error),
}

impl FleetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FleetError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors the user can fix by editing the input file.
    pub fn is_validation(&self) -> bool {
        matches!(self, FleetError::Validation(_))
    }
}
