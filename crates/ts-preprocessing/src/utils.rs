//! Shared utilities for the preprocessing pipeline.
//!
//! This module contains the dtype helpers and Series conversions used by the
//! loaders, the normalizer, the imputer and the analyzer.

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Kind of a column for preprocessing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Integer or floating point numbers
    Numeric,
    /// Text, categorical or boolean values
    Categorical,
    /// Date or datetime values
    Temporal,
    /// Binary, nested and other types
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType is a date or datetime type.
#[inline]
pub fn is_temporal_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Get the kind of a DataType.
pub fn column_kind(dtype: &DataType) -> ColumnKind {
    if is_numeric_dtype(dtype) {
        ColumnKind::Numeric
    } else if is_temporal_dtype(dtype) {
        ColumnKind::Temporal
    } else if matches!(
        dtype,
        DataType::String | DataType::Boolean | DataType::Categorical(_, _) | DataType::Enum(_, _)
    ) {
        ColumnKind::Categorical
    } else {
        ColumnKind::Other
    }
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Common error/missing value markers in data.
pub const ERROR_MARKERS: [&str; 9] = [
    "error", "unknown", "n/a", "na", "nan", "null", "missing", "none", "#n/a",
];

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Check if a string is an error/missing value marker.
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Try to parse a string as a numeric value (f64).
///
/// Handles common formatting like currency symbols, percentages, and thousands separators.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    if is_error_marker(s) {
        return None;
    }
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Series Conversion Utilities
// =============================================================================

/// Values of a numeric Series as `f64`, nulls preserved.
pub fn f64_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Physical values of a `Datetime(ms)` Series.
pub fn datetime_millis(series: &Series) -> PolarsResult<Vec<Option<i64>>> {
    let physical = series
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        .cast(&DataType::Int64)?;
    Ok(physical.i64()?.into_iter().collect())
}

/// Build a `Datetime(ms)` Series from epoch milliseconds.
pub fn datetime_series(name: PlSmallStr, millis: Vec<Option<i64>>) -> PolarsResult<Series> {
    Series::new(name, millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
}

/// Build a new Series by picking rows of `series`.
///
/// `positions[i]` is the source row of output row `i`; `None` yields a null.
/// The dtype of the input is preserved.
pub fn take_rows(series: &Series, positions: &[Option<usize>]) -> PolarsResult<Series> {
    let name = series.name().clone();
    let dtype = series.dtype().clone();

    match &dtype {
        dt if is_integer_dtype(dt) => {
            let cast = series.cast(&DataType::Int64)?;
            let ca = cast.i64()?;
            let values: Vec<Option<i64>> = positions
                .iter()
                .map(|p| p.and_then(|i| ca.get(i)))
                .collect();
            Series::new(name, values).cast(&dtype)
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = series.cast(&DataType::Float64)?;
            let ca = cast.f64()?;
            let values: Vec<Option<f64>> = positions
                .iter()
                .map(|p| p.and_then(|i| ca.get(i)))
                .collect();
            Series::new(name, values).cast(&dtype)
        }
        DataType::Boolean => {
            let ca = series.bool()?;
            let values: Vec<Option<bool>> = positions
                .iter()
                .map(|p| p.and_then(|i| ca.get(i)))
                .collect();
            Ok(Series::new(name, values))
        }
        DataType::Datetime(_, _) | DataType::Duration(_) => {
            let physical = series.to_physical_repr();
            let ca = physical.i64()?;
            let values: Vec<Option<i64>> = positions
                .iter()
                .map(|p| p.and_then(|i| ca.get(i)))
                .collect();
            Series::new(name, values).cast(&dtype)
        }
        DataType::Date => {
            let physical = series.to_physical_repr();
            let ca = physical.i32()?;
            let values: Vec<Option<i32>> = positions
                .iter()
                .map(|p| p.and_then(|i| ca.get(i)))
                .collect();
            Series::new(name, values).cast(&dtype)
        }
        DataType::String => {
            let ca = series.str()?;
            let values: Vec<Option<&str>> = positions
                .iter()
                .map(|p| p.and_then(|i| ca.get(i)))
                .collect();
            Ok(Series::new(name, values))
        }
        _ => {
            let as_text = take_rows(&series.cast(&DataType::String)?, positions)?;
            as_text.cast(&dtype)
        }
    }
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Row index of the first occurrence of the most frequent non-null value.
///
/// Ties resolve to the value that occurs first in the Series.
pub fn first_mode_index(series: &Series) -> PolarsResult<Option<usize>> {
    // value -> (count, first row)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for i in 0..series.len() {
        let value = series.get(i)?;
        if value.is_null() {
            continue;
        }
        counts.entry(value.to_string()).or_insert((0, i)).0 += 1;
    }

    Ok(counts
        .into_values()
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(_, first_row)| first_row))
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
///
/// Present values are kept exactly. The dtype of `series` is preserved unless
/// an integer column receives a value it cannot hold (fractional or out of
/// range), in which case the result is `Float64`.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let name = series.name().clone();
    let exact = Series::new(name.clone(), &[fill_value]).cast(series.dtype())?;
    let fits = !is_integer_dtype(series.dtype())
        || (fill_value.fract() == 0.0 && exact.null_count() == 0);

    let (base, fill) = if fits {
        (series.clone(), exact)
    } else {
        (
            series.cast(&DataType::Float64)?,
            Series::new(name, &[fill_value]),
        )
    };
    base.zip_with(&series.is_not_null(), &fill.new_from_index(0, series.len()))
}

/// Fill null values in a String Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let values: Vec<&str> = series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

// =============================================================================
// Tests
// =============================================================================
