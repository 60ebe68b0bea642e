//! Imputation module for handling missing values.
//!
//! The caller always selects the policy explicitly; nothing is inferred from
//! column types. Supported policies:
//! - Drop rows with missing values (globally or for one column)
//! - Fill a constant
//! - Fill a statistic (mean, median, max)
//! - Fill the most frequent value
//!
//! The temporal key is never imputed, and columns without missing entries are
//! never modified.

mod cleaning;
mod statistical;

pub use cleaning::{ConvertTarget, convert_column, drop_duplicates};
pub use statistical::StatisticalImputer;

use crate::error::ImputeError;
use crate::table::TimeTable;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Which columns a policy applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Every value column.
    All,
    /// A single named column.
    Column(String),
}

/// Constant written into missing entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Number(f64),
    Text(String),
}

impl From<&str> for FillValue {
    /// Numbers are recognised the same way numeric text columns are parsed.
    fn from(raw: &str) -> Self {
        match crate::utils::parse_numeric_string(raw) {
            Some(n) => Self::Number(n),
            None => Self::Text(raw.to_string()),
        }
    }
}

/// Statistic used by [`ImputePolicy::FillStatistic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Mean,
    Median,
    Max,
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Max => "max",
        })
    }
}

/// How missing values are handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ImputePolicy {
    /// Remove rows with a missing value in scope.
    DropRows { scope: Scope },
    /// Replace missing entries with a constant.
    FillConstant { scope: Scope, value: FillValue },
    /// Replace missing entries of a numeric column with a statistic.
    FillStatistic { column: String, statistic: Statistic },
    /// Replace missing entries with the most frequent value.
    FillMode { column: String },
}

/// Applies an [`ImputePolicy`] to a table.
pub struct ColumnImputer;

impl ColumnImputer {
    /// Apply `policy` to the value columns of a time table.
    pub fn impute(table: &TimeTable, policy: &ImputePolicy) -> Result<TimeTable, ImputeError> {
        let frame = Self::impute_frame(table.frame(), policy, Some(table.key_name()))?;
        Ok(TimeTable::from_frame(frame)?)
    }

    /// Apply `policy` to a plain frame.
    ///
    /// `key` names a column that is protected from the policy.
    pub fn impute_frame(
        frame: &DataFrame,
        policy: &ImputePolicy,
        key: Option<&str>,
    ) -> Result<DataFrame, ImputeError> {
        debug!("Applying {:?}", policy);

        match policy {
            ImputePolicy::DropRows { scope } => {
                let columns = Self::resolve(frame, scope, key)?;
                Self::drop_rows(frame, &columns)
            }
            ImputePolicy::FillConstant { scope, value } => {
                let columns = Self::resolve(frame, scope, key)?;
                let mut out = frame.clone();
                for name in columns {
                    let series = frame.column(&name)?.as_materialized_series();
                    let fits = StatisticalImputer::accepts(series.dtype(), value);
                    if matches!(scope, Scope::All) && !fits {
                        debug!("Skipping '{}': constant does not fit {}", name, series.dtype());
                        continue;
                    }
                    if let Some(filled) = StatisticalImputer::apply_constant(series, value)? {
                        debug!(
                            "Filled {} missing in '{}' with constant",
                            series.null_count(),
                            name
                        );
                        out.replace(&name, filled)?;
                    }
                }
                Ok(out)
            }
            ImputePolicy::FillStatistic { column, statistic } => {
                let series = Self::target(frame, column, key)?;
                let filled = StatisticalImputer::apply_statistic(series, *statistic)?;
                Self::replace_with(frame, column, filled)
            }
            ImputePolicy::FillMode { column } => {
                let series = Self::target(frame, column, key)?;
                let filled = StatisticalImputer::apply_mode(series)?;
                Self::replace_with(frame, column, filled)
            }
        }
    }

    /// Convert a value column of a time table.
    pub fn convert(
        table: &TimeTable,
        column: &str,
        target: ConvertTarget,
    ) -> Result<TimeTable, ImputeError> {
        Self::target(table.frame(), column, Some(table.key_name()))?;
        let frame = convert_column(table.frame(), column, target)?;
        debug!("Converted '{}' to {}", column, target);
        Ok(TimeTable::from_frame(frame)?)
    }

    fn drop_rows(frame: &DataFrame, columns: &[String]) -> Result<DataFrame, ImputeError> {
        let mut keep = vec![true; frame.height()];
        for name in columns {
            let mask = frame.column(name)?.as_materialized_series().is_null();
            for (row, flag) in keep.iter_mut().enumerate() {
                if mask.get(row).unwrap_or(false) {
                    *flag = false;
                }
            }
        }

        let out = frame.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
        debug!("Dropped {} rows with missing values", frame.height() - out.height());
        Ok(out)
    }

    fn replace_with(
        frame: &DataFrame,
        column: &str,
        filled: Option<Series>,
    ) -> Result<DataFrame, ImputeError> {
        let mut out = frame.clone();
        if let Some(filled) = filled {
            out.replace(column, filled)?;
        }
        Ok(out)
    }

    /// Value columns selected by `scope`.
    fn resolve(
        frame: &DataFrame,
        scope: &Scope,
        key: Option<&str>,
    ) -> Result<Vec<String>, ImputeError> {
        match scope {
            Scope::All => Ok(frame
                .get_column_names()
                .into_iter()
                .filter(|name| Some(name.as_str()) != key)
                .map(|name| name.to_string())
                .collect()),
            Scope::Column(column) => {
                Self::target(frame, column, key)?;
                Ok(vec![column.clone()])
            }
        }
    }

    fn target<'a>(
        frame: &'a DataFrame,
        column: &str,
        key: Option<&str>,
    ) -> Result<&'a Series, ImputeError> {
        if key == Some(column) {
            return Err(ImputeError::TemporalKey(column.to_string()));
        }
        frame
            .column(column)
            .map(|c| c.as_materialized_series())
            .map_err(|_| ImputeError::ColumnNotFound(column.to_string()))
    }
}
