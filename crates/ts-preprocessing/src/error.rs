//! Error types for the time-series preprocessing pipeline.
//!
//! Each stage of the pipeline has its own error enum so callers can tell a
//! failed load from a failed normalization without string matching.
//! [`PreprocessError`] wraps all of them for callers that just want to report.
//!
//! Errors are serializable as `{ code, message }` so they can be emitted as
//! JSON by the CLI.

use crate::config::ConfigValidationError;
use polars::error::PolarsError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading a source file into a time-indexed table.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file could not be opened or read.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No loader is registered for the file extension.
    #[error("Unsupported file format: '{0}'")]
    UnsupportedFormat(String),

    /// The content is not valid tabular data for the selected format.
    #[error("Failed to parse '{path}' as tabular data: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// The spreadsheet could not be opened or the sheet does not exist.
    #[error("Failed to read spreadsheet '{path}': {reason}")]
    Spreadsheet { path: PathBuf, reason: String },

    /// The source has no columns at all.
    #[error("Source contains no columns")]
    NoColumns,

    /// Not a single row of the key column could be coerced to a timestamp.
    #[error("No usable temporal key in column '{column}'")]
    NoTemporalKey { column: String },

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Failure while reindexing a table onto a time grid.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("No data loaded")]
    NotLoaded,

    /// Every key is missing.
    #[error("Table has no valid temporal key")]
    NoTemporalKey,

    /// Interpolation needs at least two distinct timestamps.
    #[error("At least two distinct timestamps are required, found {found}")]
    InsufficientTimestamps { found: usize },

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Failure while filling or dropping missing values.
#[derive(Error, Debug)]
pub enum ImputeError {
    #[error("No data loaded")]
    NotLoaded,

    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// The temporal key is managed by the normalizer only.
    #[error("Column '{0}' is the temporal key and cannot be modified")]
    TemporalKey(String),

    /// A numeric statistic was requested on a non-numeric column.
    #[error("Column '{column}' has non-numeric type {dtype}")]
    NonNumericColumn { column: String, dtype: String },

    /// A constant does not fit the column type.
    #[error("Fill value is incompatible with column '{column}' of type {dtype}")]
    IncompatibleValue { column: String, dtype: String },

    /// The statistic is undefined because every entry is missing.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Failure while computing trends and summary statistics.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("No data loaded")]
    NotLoaded,

    #[error("Table is empty")]
    EmptyTable,

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Failure while writing a table to disk.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No data loaded")]
    NotLoaded,

    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Umbrella error for callers that drive the whole pipeline.
#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Impute(#[from] ImputeError),

    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),
}

impl PreprocessError {
    /// Stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Load(LoadError::UnsupportedFormat(_)) => "UNSUPPORTED_FORMAT",
            Self::Load(LoadError::NoTemporalKey { .. }) => "NO_TEMPORAL_KEY",
            Self::Load(_) => "LOAD_FAILED",
            Self::Normalize(NormalizeError::NotLoaded)
            | Self::Impute(ImputeError::NotLoaded)
            | Self::Analyze(AnalyzeError::NotLoaded)
            | Self::Export(ExportError::NotLoaded) => "NO_DATA_LOADED",
            Self::Normalize(_) => "NORMALIZE_FAILED",
            Self::Impute(ImputeError::ColumnNotFound(_)) => "COLUMN_NOT_FOUND",
            Self::Impute(_) => "IMPUTE_FAILED",
            Self::Analyze(AnalyzeError::EmptyTable) => "EMPTY_TABLE",
            Self::Analyze(_) => "ANALYZE_FAILED",
            Self::Export(_) => "EXPORT_FAILED",
            Self::Config(_) => "INVALID_CONFIG",
        }
    }

    /// Whether the error only means an operation ran before `load`.
    pub fn is_not_loaded(&self) -> bool {
        self.error_code() == "NO_DATA_LOADED"
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PreprocessError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for whole-pipeline operations.
pub type Result<T> = std::result::Result<T, PreprocessError>;
