//! Time-grid normalization.
//!
//! A table is reindexed onto the regular grid `min + k * step` spanning its
//! smallest and largest timestamp:
//!
//! 1. Rows with a missing key are discarded.
//! 2. Duplicate timestamps keep their first row.
//! 3. Grid points with no source row are inserted with missing values; source
//!    rows that fall between grid points are not carried over.
//! 4. Numeric columns are widened to `Float64` and their interior gaps filled
//!    with the selected [`Interpolation`]. Other columns keep their nulls.

mod frequency;
mod interpolation;

pub use frequency::{Frequency, FrequencyUnit, ParseFrequencyError};
pub use interpolation::{Interpolation, interpolate};

use crate::error::NormalizeError;
use crate::table::TimeTable;
use crate::utils::{datetime_series, f64_values, is_numeric_dtype, take_rows};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Reindex `table` onto a grid of step `frequency` and fill numeric gaps.
///
/// Normalizing a table that is already on the grid returns an equal table.
pub fn normalize(
    table: &TimeTable,
    frequency: Frequency,
    method: Interpolation,
) -> Result<TimeTable, NormalizeError> {
    let timestamps = table.timestamps()?;

    // timestamp -> first source row
    let mut first_rows: HashMap<i64, usize> = HashMap::new();
    for (row, ts) in timestamps.iter().enumerate() {
        if let Some(ts) = ts {
            first_rows.entry(*ts).or_insert(row);
        }
    }

    let (Some(&start), Some(&end)) = (first_rows.keys().min(), first_rows.keys().max()) else {
        return Err(NormalizeError::NoTemporalKey);
    };
    if first_rows.len() < 2 {
        return Err(NormalizeError::InsufficientTimestamps {
            found: first_rows.len(),
        });
    }

    let step = frequency.step_millis();
    let grid: Vec<i64> = (start..=end).step_by(step as usize).collect();
    let positions: Vec<Option<usize>> = grid
        .iter()
        .map(|ts| first_rows.get(ts).copied())
        .collect();

    let matched = positions.iter().flatten().count();
    debug!(
        "Grid at {} spans {} points: {} matched, {} inserted, {} source rows off-grid or missing",
        frequency,
        grid.len(),
        matched,
        grid.len() - matched,
        table.height() - matched
    );

    // interpolation coordinates in units of the grid step
    let times: Vec<f64> = grid.iter().map(|ts| (ts - start) as f64 / step as f64).collect();

    let frame = table.frame();
    let mut columns = Vec::with_capacity(frame.width().saturating_sub(1));
    for name in table.value_columns() {
        let series = frame.column(&name)?.as_materialized_series();
        let reindexed = if is_numeric_dtype(series.dtype()) {
            let values = f64_values(series)?;
            let on_grid: Vec<Option<f64>> = positions
                .iter()
                .map(|p| p.and_then(|row| values[row]))
                .collect();
            let filled = interpolate(&times, &on_grid, method);
            Series::new(series.name().clone(), filled)
        } else {
            take_rows(series, &positions)?
        };
        columns.push(reindexed.into_column());
    }

    let key = datetime_series(
        table.key_name().into(),
        grid.into_iter().map(Some).collect(),
    )?;
    let values = DataFrame::new(columns)?;
    Ok(TimeTable::from_parts(key, values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DAY: i64 = 86_400_000;

    fn table(timestamps: Vec<Option<i64>>, values: DataFrame) -> TimeTable {
        TimeTable::from_parts(datetime_series("date".into(), timestamps).unwrap(), values).unwrap()
    }

    fn column_f64(table: &TimeTable, name: &str) -> Vec<Option<f64>> {
        f64_values(table.frame().column(name).unwrap().as_materialized_series()).unwrap()
    }

    #[test]
    fn test_daily_gap_gains_rows_and_is_filled() {
        // days 0, 1, 5, 6: a three-day gap
        let t = table(
            vec![Some(0), Some(DAY), Some(5 * DAY), Some(6 * DAY)],
            df!["price" => [1.0, 2.0, 6.0, 7.0]].unwrap(),
        );

        let out = normalize(&t, Frequency::daily(), Interpolation::Time).unwrap();
        assert_eq!(out.height(), 7);
        assert_eq!(
            column_f64(&out, "price"),
            vec![
                Some(1.0),
                Some(2.0),
                Some(3.0),
                Some(4.0),
                Some(5.0),
                Some(6.0),
                Some(7.0)
            ]
        );
    }

    #[test]
    fn test_missing_keys_duplicates_and_off_grid_rows() {
        let t = table(
            vec![Some(2 * DAY), None, Some(0), Some(0), Some(DAY / 2)],
            df!["v" => [3i64, 99, 1, 50, 77], "tag" => ["c", "x", "a", "dup", "half"]].unwrap(),
        );

        let out = normalize(&t, Frequency::daily(), Interpolation::Linear).unwrap();
        assert_eq!(out.timestamps().unwrap(), vec![Some(0), Some(DAY), Some(2 * DAY)]);
        assert_eq!(column_f64(&out, "v"), vec![Some(1.0), Some(2.0), Some(3.0)]);

        let tags: Vec<Option<&str>> = out
            .frame()
            .column("tag")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(tags, vec![Some("a"), None, Some("c")]);
    }

    #[test]
    fn test_edges_are_not_extrapolated() {
        let t = table(
            vec![Some(0), Some(DAY), Some(2 * DAY), Some(3 * DAY)],
            df!["v" => [None, Some(1.0), None, None]].unwrap(),
        );
        let out = normalize(&t, Frequency::daily(), Interpolation::Spline).unwrap();
        assert_eq!(column_f64(&out, "v"), vec![None, Some(1.0), None, None]);
    }

    #[test]
    fn test_idempotent() {
        let t = table(
            vec![Some(0), Some(3 * DAY), Some(4 * DAY), Some(8 * DAY)],
            df!["v" => [0.0, 9.0, 16.0, 64.0], "n" => [Some(1i32), None, Some(2), Some(5)]].unwrap(),
        );

        for method in [
            Interpolation::Time,
            Interpolation::Linear,
            Interpolation::Spline,
            Interpolation::Polynomial,
        ] {
            let once = normalize(&t, Frequency::daily(), method).unwrap();
            let twice = normalize(&once, Frequency::daily(), method).unwrap();
            assert!(once.frame().equals_missing(twice.frame()), "{}", method);
        }
    }

    #[test]
    fn test_hourly_frequency() {
        let hour = 3_600_000;
        let t = table(vec![Some(0), Some(6 * hour)], df!["v" => [0.0, 6.0]].unwrap());
        let out = normalize(&t, "3H".parse().unwrap(), Interpolation::Time).unwrap();

        assert_eq!(
            out.timestamps().unwrap(),
            vec![Some(0), Some(3 * hour), Some(6 * hour)]
        );
        assert_eq!(column_f64(&out, "v"), vec![Some(0.0), Some(3.0), Some(6.0)]);
    }

    #[test]
    fn test_no_valid_key() {
        let t = table(vec![None, None], df!["v" => [1.0, 2.0]].unwrap());
        let err = normalize(&t, Frequency::daily(), Interpolation::Time).unwrap_err();
        assert!(matches!(err, NormalizeError::NoTemporalKey));
    }

    #[test]
    fn test_single_distinct_timestamp() {
        let t = table(vec![Some(0), Some(0)], df!["v" => [1.0, 2.0]].unwrap());
        let err = normalize(&t, Frequency::daily(), Interpolation::Time).unwrap_err();
        assert!(matches!(err, NormalizeError::InsufficientTimestamps { found: 1 }));
    }
}
