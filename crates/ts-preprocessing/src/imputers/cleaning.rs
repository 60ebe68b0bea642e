//! Row de-duplication and column type conversion.

use crate::error::ImputeError;
use crate::loaders::timestamps::{FloatEpoch, coerce_to_timestamps};
use crate::utils::{f64_values, is_integer_dtype, is_numeric_dtype, parse_numeric_string};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target type of [`convert_column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvertTarget {
    /// 64-bit integers; fractional values are rounded half away from zero.
    Int,
    /// 64-bit floats.
    Float,
    /// Text.
    Text,
    /// Millisecond timestamps.
    Datetime,
}

impl fmt::Display for ConvertTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Datetime => "datetime",
        };
        f.write_str(name)
    }
}

impl FromStr for ConvertTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(Self::Int),
            "float" | "number" => Ok(Self::Float),
            "text" | "string" | "str" => Ok(Self::Text),
            "datetime" | "date" => Ok(Self::Datetime),
            other => Err(format!(
                "unknown type '{}' (expected int, float, text or datetime)",
                other
            )),
        }
    }
}

/// Remove rows that repeat an earlier row in every column.
///
/// Order is preserved and the first occurrence is kept. Two missing entries
/// compare equal.
pub fn drop_duplicates(frame: &DataFrame) -> PolarsResult<DataFrame> {
    frame.unique_stable(None, UniqueKeepStrategy::First, None)
}

/// Convert one column of `frame` to `target`.
///
/// Entries that cannot be represented in the target type become missing.
pub fn convert_column(
    frame: &DataFrame,
    column: &str,
    target: ConvertTarget,
) -> Result<DataFrame, ImputeError> {
    let series = frame
        .column(column)
        .map_err(|_| ImputeError::ColumnNotFound(column.to_string()))?
        .as_materialized_series();

    let converted = match target {
        ConvertTarget::Float => Series::new(series.name().clone(), numeric_values(series)?),
        ConvertTarget::Int if is_integer_dtype(series.dtype()) => series.cast(&DataType::Int64)?,
        ConvertTarget::Int => {
            let values: Vec<Option<i64>> = numeric_values(series)?
                .into_iter()
                .map(|v| v.map(|x| x.round() as i64))
                .collect();
            Series::new(series.name().clone(), values)
        }
        ConvertTarget::Text => series.cast(&DataType::String)?,
        ConvertTarget::Datetime => coerce_to_timestamps(series, FloatEpoch::UnixMillis)?,
    };

    let mut out = frame.clone();
    out.replace(column, converted)?;
    Ok(out)
}

/// Column values as numbers, parsing text the way spreadsheets format it.
fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    match series.dtype() {
        dt if is_numeric_dtype(dt) => f64_values(series),
        DataType::Boolean => Ok(series
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| if b { 1.0 } else { 0.0 }))
            .collect()),
        DataType::String => Ok(series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_numeric_string))
            .collect()),
        _ => Ok(f64_values(series).unwrap_or_else(|_| vec![None; series.len()])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn people() -> DataFrame {
        df![
            "name" => [Some("Alice"), Some("Alice"), None, Some("David")],
            "age" => [Some(30i64), Some(30), Some(12), None],
            "city" => [Some("Arizona"), Some("Arizona"), None, Some("Taraba")],
        ]
        .unwrap()
    }

    #[test]
    fn test_drop_duplicates_keeps_first_in_order() {
        let out = drop_duplicates(&people()).unwrap();

        assert_eq!(out.height(), 3);
        let names: Vec<Option<&str>> = out
            .column("name")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(names, vec![Some("Alice"), None, Some("David")]);
        let ages: Vec<Option<i64>> = out
            .column("age")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(ages, vec![Some(30), Some(12), None]);
    }

    #[test]
    fn test_drop_duplicates_distinguishes_null_from_text() {
        let frame = df!["s" => [None, Some("null"), None]].unwrap();
        assert_eq!(drop_duplicates(&frame).unwrap().height(), 2);
    }

    #[test]
    fn test_convert_text_to_float_and_int() {
        let frame = df!["raw" => ["$1,200.50", "oops", "7"]].unwrap();

        let floats = convert_column(&frame, "raw", ConvertTarget::Float).unwrap();
        let values: Vec<Option<f64>> = floats
            .column("raw")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(1200.5), None, Some(7.0)]);

        let ints = convert_column(&frame, "raw", ConvertTarget::Int).unwrap();
        let values: Vec<Option<i64>> = ints
            .column("raw")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(1201), None, Some(7)]);
    }

    #[test]
    fn test_convert_float_to_int_rounds() {
        let frame = df!["x" => [Some(2.7), Some(-1.6), Some(-2.5), None]].unwrap();
        let out = convert_column(&frame, "x", ConvertTarget::Int).unwrap();

        let values: Vec<Option<i64>> = out
            .column("x")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(3), Some(-2), Some(-3), None]);
    }

    #[test]
    fn test_convert_large_integers_to_int_is_exact() {
        let big = 9_007_199_254_740_993u64;
        let frame = df!["id" => [big]].unwrap();
        let out = convert_column(&frame, "id", ConvertTarget::Int).unwrap();
        assert_eq!(out.column("id").unwrap().i64().unwrap().get(0), Some(big as i64));
    }

    #[test]
    fn test_convert_to_datetime() {
        let frame = df!["when" => ["2023-01-01", "never"]].unwrap();
        let out = convert_column(&frame, "when", ConvertTarget::Datetime).unwrap();

        let when = out.column("when").unwrap();
        assert!(matches!(when.dtype(), DataType::Datetime(TimeUnit::Milliseconds, _)));
        assert_eq!(when.null_count(), 1);
    }

    #[test]
    fn test_convert_unknown_column() {
        let err = convert_column(&people(), "salary", ConvertTarget::Float).unwrap_err();
        assert!(matches!(err, ImputeError::ColumnNotFound(c) if c == "salary"));
    }

    #[test]
    fn test_parse_target() {
        assert_eq!("Integer".parse::<ConvertTarget>().unwrap(), ConvertTarget::Int);
        assert_eq!("str".parse::<ConvertTarget>().unwrap(), ConvertTarget::Text);
        assert!("complex".parse::<ConvertTarget>().is_err());
    }
}
