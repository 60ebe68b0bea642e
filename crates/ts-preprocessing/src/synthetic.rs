//! Synthetic daily market data for demos and tests.

use crate::table::TimeTable;
use crate::utils::datetime_series;
use chrono::NaiveDate;
use polars::prelude::*;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Shape of a generated dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    /// Number of daily rows.
    pub rows: usize,
    /// Date of the first row.
    pub start: NaiveDate,
    /// Probability that any single value is missing, clamped to `[0, 1]`.
    pub null_ratio: f64,
    pub seed: u64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            rows: 100,
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            null_ratio: 0.1,
            seed: 42,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Generate `price`, `volume`, `sentiment` and `volatility` columns indexed by
/// consecutive days. The same spec always yields the same table.
pub fn generate(spec: &SyntheticSpec) -> PolarsResult<TimeTable> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let null_ratio = spec.null_ratio.clamp(0.0, 1.0);

    let start = spec
        .start
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default();
    let key: Vec<Option<i64>> = (0..spec.rows as i64)
        .map(|day| Some(start + day * 86_400_000))
        .collect();

    let mut price = Vec::with_capacity(spec.rows);
    let mut volume = Vec::with_capacity(spec.rows);
    let mut sentiment = Vec::with_capacity(spec.rows);
    let mut volatility = Vec::with_capacity(spec.rows);
    for _ in 0..spec.rows {
        price.push(round_to(rng.gen_range(50.0..200.0), 2));
        volume.push(rng.gen_range(1_000i64..1_000_000));
        sentiment.push(round_to(rng.gen_range(-1.0..1.0), 2));
        volatility.push(round_to(rng.gen_range(0.01..0.2), 3));
    }

    let mut blank = |values: Vec<f64>| -> Vec<Option<f64>> {
        values
            .into_iter()
            .map(|v| (!rng.gen_bool(null_ratio)).then_some(v))
            .collect()
    };
    let price = blank(price);
    let sentiment = blank(sentiment);
    let volatility = blank(volatility);
    let volume: Vec<Option<i64>> = volume
        .into_iter()
        .map(|v| (!rng.gen_bool(null_ratio)).then_some(v))
        .collect();

    let values = DataFrame::new(vec![
        Series::new("price".into(), price).into_column(),
        Series::new("volume".into(), volume).into_column(),
        Series::new("sentiment".into(), sentiment).into_column(),
        Series::new("volatility".into(), volatility).into_column(),
    ])?;
    TimeTable::from_parts(datetime_series("date".into(), key)?, values)
}
