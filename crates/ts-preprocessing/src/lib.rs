//! Time-Series Preprocessing Library
//!
//! Format-aware preprocessing of tabular time-series files built on Polars.
//!
//! # Overview
//!
//! A [`Preprocessor`] is created for one [`SourceFormat`] and runs four steps
//! over a single working table:
//!
//! - **Load**: read the file and promote its first column to the temporal key
//! - **Normalize**: reindex onto a fixed-frequency grid and fill interior gaps
//!   with the format's interpolation method
//! - **Impute**: fill or drop missing values with an explicit [`ImputePolicy`]
//! - **Analyze**: compute mean first differences and descriptive statistics
//!
//! | Format | Extensions | Interpolation |
//! |---|---|---|
//! | delimited text | `.csv`, `.tsv`, `.txt` | linear in time |
//! | spreadsheet | `.xlsx`, `.xls`, `.xlsm`, `.ods` | linear in position |
//! | row JSON | `.json`, `.jsonl`, `.ndjson` | quadratic spline |
//! | columnar binary | `.parquet` | local quadratic |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ts_preprocessing::{ImputePolicy, Preprocessor, Statistic};
//!
//! let mut pre = Preprocessor::for_path("prices.csv")?;
//! pre.load("prices.csv")?;
//! pre.normalize()?;
//! pre.handle_missing_values(&ImputePolicy::FillStatistic {
//!     column: "volume".into(),
//!     statistic: Statistic::Median,
//! })?;
//!
//! let report = pre.trend_analysis()?;
//! println!("{}", report);
//! pre.export("out/prices_clean.csv")?;
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use ts_preprocessing::PreprocessConfig;
//!
//! let config = PreprocessConfig::builder()
//!     .frequency("1H".parse()?)
//!     .csv_separator(';')
//!     .sheet_index(1)
//!     .build()?;
//! let pre = Preprocessor::for_path("readings.csv")?.with_config(config)?;
//! ```
//!
//! # Logging
//!
//! Every step emits `tracing` events inside the preprocessor's span. The
//! library never installs a subscriber.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod imputers;
pub mod normalizer;
pub mod persist;
pub mod pipeline;
pub mod synthetic;
pub mod table;
pub mod utils;

pub(crate) mod loaders;

pub use analyzer::{ColumnSummary, ColumnTrend, SummaryStats, TrendAnalyzer, TrendReport};
pub use config::{ConfigValidationError, PreprocessConfig, PreprocessConfigBuilder};
pub use error::{
    AnalyzeError, ExportError, ImputeError, LoadError, NormalizeError, PreprocessError, Result,
};
pub use imputers::{ColumnImputer, ConvertTarget, FillValue, ImputePolicy, Scope, Statistic};
pub use normalizer::{Frequency, FrequencyUnit, Interpolation, normalize};
pub use pipeline::{Preprocessor, SourceFormat, Stage};
pub use synthetic::{SyntheticSpec, generate};
pub use table::TimeTable;
