//! Statistical and constant fills for a single column.
//!
//! Every function returns `Ok(None)` when the column has no missing entries,
//! so untouched columns keep their dtype and values.

use super::{FillValue, Statistic};
use crate::error::ImputeError;
use crate::utils::{
    ColumnKind, column_kind, fill_numeric_nulls, fill_string_nulls, first_mode_index, take_rows,
};
use polars::prelude::*;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Compute `statistic` over the non-missing entries of a numeric column.
    pub fn compute(series: &Series, statistic: Statistic) -> Result<Option<f64>, ImputeError> {
        Self::ensure_numeric(series)?;
        let value = match statistic {
            Statistic::Mean => series.mean(),
            Statistic::Median => series.median(),
            Statistic::Max => series.max::<f64>()?,
        };
        Ok(value)
    }

    /// Fill a numeric column with its mean, median or maximum.
    pub fn apply_statistic(
        series: &Series,
        statistic: Statistic,
    ) -> Result<Option<Series>, ImputeError> {
        Self::ensure_numeric(series)?;
        if series.null_count() == 0 {
            return Ok(None);
        }

        let Some(value) = Self::compute(series, statistic)? else {
            return Err(ImputeError::NoValidValues(series.name().to_string()));
        };
        Ok(Some(fill_numeric_nulls(series, value)?))
    }

    /// Fill with the most frequent value. Works for any dtype.
    pub fn apply_mode(series: &Series) -> Result<Option<Series>, ImputeError> {
        if series.null_count() == 0 {
            return Ok(None);
        }

        let Some(mode_row) = first_mode_index(series)? else {
            return Err(ImputeError::NoValidValues(series.name().to_string()));
        };
        let mask = series.is_null();
        let positions: Vec<Option<usize>> = (0..series.len())
            .map(|i| Some(if mask.get(i).unwrap_or(false) { mode_row } else { i }))
            .collect();

        Ok(Some(take_rows(series, &positions)?))
    }

    /// Fill with a constant.
    ///
    /// Numbers fill numeric columns and, rendered as text, string columns.
    /// Text fills string columns only; anything else is incompatible.
    pub fn apply_constant(
        series: &Series,
        value: &FillValue,
    ) -> Result<Option<Series>, ImputeError> {
        if !Self::accepts(series.dtype(), value) {
            return Err(ImputeError::IncompatibleValue {
                column: series.name().to_string(),
                dtype: series.dtype().to_string(),
            });
        }
        if series.null_count() == 0 {
            return Ok(None);
        }

        let filled = match value {
            FillValue::Number(n) if column_kind(series.dtype()) == ColumnKind::Numeric => {
                fill_numeric_nulls(series, *n)?
            }
            FillValue::Number(n) => fill_string_nulls(series, &n.to_string())?,
            FillValue::Text(text) => fill_string_nulls(series, text)?,
        };
        Ok(Some(filled))
    }

    /// Whether a constant can be written into a column of `dtype`.
    pub fn accepts(dtype: &DataType, value: &FillValue) -> bool {
        match value {
            FillValue::Number(n) => {
                n.is_finite()
                    && (column_kind(dtype) == ColumnKind::Numeric || dtype == &DataType::String)
            }
            FillValue::Text(_) => dtype == &DataType::String,
        }
    }

    fn ensure_numeric(series: &Series) -> Result<(), ImputeError> {
        if column_kind(series.dtype()) == ColumnKind::Numeric {
            Ok(())
        } else {
            Err(ImputeError::NonNumericColumn {
                column: series.name().to_string(),
                dtype: series.dtype().to_string(),
            })
        }
    }
}
