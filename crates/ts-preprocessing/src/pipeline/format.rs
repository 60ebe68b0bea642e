//! Source formats and their per-format behaviour.

use crate::config::PreprocessConfig;
use crate::error::LoadError;
use crate::loaders;
use crate::normalizer::Interpolation;
use crate::table::TimeTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The file formats a [`Preprocessor`](super::Preprocessor) can read.
///
/// Each format brings its own loader and gap-filling method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// `.csv`, `.tsv`, `.txt`
    DelimitedText,
    /// `.xlsx`, `.xls`, `.xlsm`, `.ods`
    Spreadsheet,
    /// `.json`, `.jsonl`, `.ndjson`
    RowJson,
    /// `.parquet`
    ColumnarBinary,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 4] = [
        Self::DelimitedText,
        Self::Spreadsheet,
        Self::RowJson,
        Self::ColumnarBinary,
    ];

    /// Infer the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(Self::DelimitedText),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Ok(Self::Spreadsheet),
            "json" | "jsonl" | "ndjson" => Ok(Self::RowJson),
            "parquet" | "pq" => Ok(Self::ColumnarBinary),
            _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Gap-filling method used after reindexing.
    pub fn interpolation(self) -> Interpolation {
        match self {
            Self::DelimitedText => Interpolation::Time,
            Self::Spreadsheet => Interpolation::Linear,
            Self::RowJson => Interpolation::Spline,
            Self::ColumnarBinary => Interpolation::Polynomial,
        }
    }

    /// Read `path` with this format's loader.
    pub fn load(self, path: &Path, config: &PreprocessConfig) -> Result<TimeTable, LoadError> {
        match self {
            Self::DelimitedText => loaders::load_delimited(path, config),
            Self::Spreadsheet => loaders::load_spreadsheet(path, config.sheet_index),
            Self::RowJson => loaders::load_row_json(path),
            Self::ColumnarBinary => loaders::load_columnar(path),
        }
    }

    /// Short name used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DelimitedText => "csv",
            Self::Spreadsheet => "excel",
            Self::RowJson => "json",
            Self::ColumnarBinary => "parquet",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFormat {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "text" | "delimited" => Ok(Self::DelimitedText),
            "excel" | "xlsx" | "spreadsheet" => Ok(Self::Spreadsheet),
            "json" | "jsonl" => Ok(Self::RowJson),
            "parquet" | "columnar" => Ok(Self::ColumnarBinary),
            other => Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    }
}
