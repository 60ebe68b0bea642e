//! The preprocessor orchestrates loading, normalization, imputation and
//! analysis for a single source file.

use super::SourceFormat;
use crate::analyzer::{TrendAnalyzer, TrendReport};
use crate::config::{ConfigValidationError, PreprocessConfig};
use crate::error::{AnalyzeError, ExportError, ImputeError, LoadError, NormalizeError};
use crate::imputers::{ColumnImputer, ConvertTarget, ImputePolicy, drop_duplicates};
use crate::normalizer::{Frequency, normalize};
use crate::persist;
use crate::table::TimeTable;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{Span, debug, info, info_span};

/// Where a [`Preprocessor`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Nothing loaded yet.
    Uninitialized,
    Loaded,
    Normalized,
    Imputed,
    Analyzed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Loaded => "loaded",
            Self::Normalized => "normalized",
            Self::Imputed => "imputed",
            Self::Analyzed => "analyzed",
        };
        f.write_str(name)
    }
}

/// Format-aware preprocessing of one time-series file.
///
/// The preprocessor owns one working table. `load` creates it; `normalize`,
/// `handle_missing_values`, `drop_duplicates` and `convert_column` each compute
/// a new table and swap it in only on success, so a failed step leaves the
/// table and the stage untouched.
///
/// # Example
///
/// ```rust,ignore
/// use ts_preprocessing::{ImputePolicy, Preprocessor, Scope};
///
/// let mut pre = Preprocessor::for_path("prices.csv")?;
/// pre.load("prices.csv")?;
/// pre.normalize()?;
/// pre.handle_missing_values(&ImputePolicy::DropRows { scope: Scope::All })?;
/// println!("{}", pre.trend_analysis()?);
/// ```
pub struct Preprocessor {
    format: SourceFormat,
    config: PreprocessConfig,
    table: Option<TimeTable>,
    stage: Stage,
    span: Span,
}

// Independent files may be processed on separate threads.
static_assertions::assert_impl_all!(Preprocessor: Send);

impl Preprocessor {
    /// Create a preprocessor for `format` with the default configuration.
    pub fn new(format: SourceFormat) -> Self {
        Self {
            format,
            config: PreprocessConfig::default(),
            table: None,
            stage: Stage::Uninitialized,
            span: info_span!("preprocess", format = %format),
        }
    }

    /// Create a preprocessor for the format implied by the file extension.
    pub fn for_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        SourceFormat::from_path(path.as_ref()).map(Self::new)
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: PreprocessConfig) -> Result<Self, ConfigValidationError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Record events inside `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The working table, if one has been loaded.
    pub fn table(&self) -> Option<&TimeTable> {
        self.table.as_ref()
    }

    /// Read `path` into a fresh working table, replacing any previous one.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&TimeTable, LoadError> {
        let span = self.span.clone();
        let _guard = span.enter();
        let path = path.as_ref();
        debug!("Loading {:?} as {}", path, self.format);

        let table = self.format.load(path, &self.config)?;
        info!(
            "Loaded {} rows and {} value columns from {:?}",
            table.height(),
            table.value_columns().len(),
            path
        );
        Ok(self.swap(table, Stage::Loaded))
    }

    /// Reindex onto the configured frequency.
    pub fn normalize(&mut self) -> Result<&TimeTable, NormalizeError> {
        self.normalize_to(self.config.frequency)
    }

    /// Reindex onto `frequency` using this format's interpolation method.
    pub fn normalize_to(&mut self, frequency: Frequency) -> Result<&TimeTable, NormalizeError> {
        let span = self.span.clone();
        let _guard = span.enter();
        let method = self.format.interpolation();
        debug!("Normalizing to {} with {} interpolation", frequency, method);

        let current = self.table.as_ref().ok_or(NormalizeError::NotLoaded)?;
        let before = current.height();
        let table = normalize(current, frequency, method)?;
        info!("Normalized {} rows onto {} grid points", before, table.height());
        Ok(self.swap(table, Stage::Normalized))
    }

    /// Apply a missing-value policy.
    pub fn handle_missing_values(
        &mut self,
        policy: &ImputePolicy,
    ) -> Result<&TimeTable, ImputeError> {
        let span = self.span.clone();
        let _guard = span.enter();
        debug!("Handling missing values with {:?}", policy);

        let current = self.table.as_ref().ok_or(ImputeError::NotLoaded)?;
        let table = ColumnImputer::impute(current, policy)?;
        info!(
            "Missing values handled: {} rows, {} missing entries remain",
            table.height(),
            table.missing_count()
        );
        Ok(self.swap(table, Stage::Imputed))
    }

    /// Remove exact duplicate rows. The stage is unchanged.
    pub fn drop_duplicates(&mut self) -> Result<&TimeTable, ImputeError> {
        let span = self.span.clone();
        let _guard = span.enter();
        debug!("Dropping duplicate rows");

        let current = self.table.as_ref().ok_or(ImputeError::NotLoaded)?;
        let before = current.height();
        let table = TimeTable::from_frame(drop_duplicates(current.frame())?)?;
        info!("Removed {} duplicate rows", before - table.height());
        let stage = self.stage;
        Ok(self.swap(table, stage))
    }

    /// Convert one value column. The stage is unchanged.
    pub fn convert_column(
        &mut self,
        column: &str,
        target: ConvertTarget,
    ) -> Result<&TimeTable, ImputeError> {
        let span = self.span.clone();
        let _guard = span.enter();
        debug!("Converting '{}' to {}", column, target);

        let current = self.table.as_ref().ok_or(ImputeError::NotLoaded)?;
        let table = ColumnImputer::convert(current, column, target)?;
        info!("Converted '{}' to {}", column, target);
        let stage = self.stage;
        Ok(self.swap(table, stage))
    }

    /// Compute trends and summary statistics of the working table.
    pub fn trend_analysis(&mut self) -> Result<TrendReport, AnalyzeError> {
        let span = self.span.clone();
        let _guard = span.enter();
        debug!("Analyzing trends");

        let current = self.table.as_ref().ok_or(AnalyzeError::NotLoaded)?;
        let report = TrendAnalyzer::analyze(current)?;
        info!("Analyzed {} columns", report.trend.len());
        self.stage = Stage::Analyzed;
        Ok(report)
    }

    /// Write the working table; the file extension selects the format.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let _guard = self.span.enter();
        let table = self.table.as_ref().ok_or(ExportError::NotLoaded)?;
        persist::write_table(table, path.as_ref())?;
        info!("Exported {} rows to {:?}", table.height(), path.as_ref());
        Ok(())
    }

    fn swap(&mut self, table: TimeTable, stage: Stage) -> &TimeTable {
        self.stage = stage;
        self.table.insert(table)
    }
}

impl fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preprocessor")
            .field("format", &self.format)
            .field("stage", &self.stage)
            .field("rows", &self.table.as_ref().map(TimeTable::height))
            .finish()
    }
}
