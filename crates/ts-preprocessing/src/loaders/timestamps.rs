//! Coercion of key columns to timestamps.
//!
//! Values that cannot be interpreted as a point in time become null instead of
//! failing the load, so the normalizer can treat them as gaps.

use crate::utils::datetime_series;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Days between the spreadsheet epoch (1899-12-30) and 1970-01-01.
const SPREADSHEET_EPOCH_OFFSET_DAYS: f64 = 25_569.0;

/// Integer keys in this range are read as epoch seconds, others as milliseconds.
const EPOCH_SECONDS_RANGE: std::ops::Range<i64> = 1_000_000_000..20_000_000_000;

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y"];

/// How floating point keys are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FloatEpoch {
    /// Milliseconds since the Unix epoch.
    UnixMillis,
    /// Fractional days since 1899-12-30, as stored by spreadsheets.
    SpreadsheetSerial,
}

/// Parse a single timestamp string into epoch milliseconds.
pub(crate) fn parse_timestamp(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis());
        }
    }

    None
}

/// Convert a spreadsheet serial day number to epoch milliseconds.
pub(crate) fn serial_to_millis(serial: f64) -> Option<i64> {
    if !serial.is_finite() {
        return None;
    }
    Some(((serial - SPREADSHEET_EPOCH_OFFSET_DAYS) * MILLIS_PER_DAY).round() as i64)
}

fn integer_to_millis(value: i64) -> i64 {
    if EPOCH_SECONDS_RANGE.contains(&value) {
        value * 1_000
    } else {
        value
    }
}

/// Coerce a Series of any supported dtype to `Datetime(ms)`.
///
/// Unparseable entries become null; unsupported dtypes yield an all-null key.
pub(crate) fn coerce_to_timestamps(series: &Series, floats: FloatEpoch) -> PolarsResult<Series> {
    let name = series.name().clone();

    let millis: Vec<Option<i64>> = match series.dtype() {
        DataType::Datetime(unit, _) => {
            let divisor = match unit {
                TimeUnit::Nanoseconds => 1_000_000,
                TimeUnit::Microseconds => 1_000,
                TimeUnit::Milliseconds => 1,
            };
            let physical = series.to_physical_repr();
            physical
                .i64()?
                .into_iter()
                .map(|v| v.map(|raw| raw.div_euclid(divisor)))
                .collect()
        }
        DataType::Date => {
            let physical = series.to_physical_repr();
            physical
                .i32()?
                .into_iter()
                .map(|v| v.map(|days| i64::from(days) * 86_400_000))
                .collect()
        }
        dt if crate::utils::is_integer_dtype(dt) => series
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| v.map(integer_to_millis))
            .collect(),
        DataType::Float32 | DataType::Float64 => series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| {
                v.and_then(|raw| match floats {
                    FloatEpoch::UnixMillis => raw.is_finite().then(|| raw.round() as i64),
                    FloatEpoch::SpreadsheetSerial => serial_to_millis(raw),
                })
            })
            .collect(),
        DataType::String => series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_timestamp))
            .collect(),
        _ => vec![None; series.len()],
    };

    datetime_series(name, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::datetime_millis;

    const JAN_1_2023: i64 = 1_672_531_200_000;

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("2023-01-01"), Some(JAN_1_2023));
        assert_eq!(parse_timestamp("2023/01/01"), Some(JAN_1_2023));
        assert_eq!(parse_timestamp("2023-01-01 00:00:00"), Some(JAN_1_2023));
        assert_eq!(parse_timestamp("2023-01-01T00:00:00.000"), Some(JAN_1_2023));
        assert_eq!(parse_timestamp("2023-01-01T01:00:00+01:00"), Some(JAN_1_2023));
        assert_eq!(parse_timestamp("  2023-01-01 06:30 "), Some(JAN_1_2023 + 23_400_000));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("2023-13-45"), None);
    }

    #[test]
    fn test_serial_to_millis() {
        // 44927 is 2023-01-01 in spreadsheet serial days
        assert_eq!(serial_to_millis(44_927.0), Some(JAN_1_2023));
        assert_eq!(serial_to_millis(44_927.5), Some(JAN_1_2023 + 43_200_000));
        assert_eq!(serial_to_millis(f64::NAN), None);
    }

    #[test]
    fn test_coerce_strings_with_failures_become_null() {
        let series = Series::new("date".into(), &[Some("2023-01-01"), Some("oops"), None]);
        let coerced = coerce_to_timestamps(&series, FloatEpoch::UnixMillis).unwrap();

        assert_eq!(coerced.name().as_str(), "date");
        assert_eq!(
            datetime_millis(&coerced).unwrap(),
            vec![Some(JAN_1_2023), None, None]
        );
    }

    #[test]
    fn test_coerce_integers_seconds_and_millis() {
        let series = Series::new("t".into(), &[1_672_531_200i64, JAN_1_2023]);
        let coerced = coerce_to_timestamps(&series, FloatEpoch::UnixMillis).unwrap();

        assert_eq!(
            datetime_millis(&coerced).unwrap(),
            vec![Some(JAN_1_2023), Some(JAN_1_2023)]
        );
    }

    #[test]
    fn test_coerce_spreadsheet_serials() {
        let series = Series::new("t".into(), &[44_927.0f64, 44_928.0]);
        let coerced = coerce_to_timestamps(&series, FloatEpoch::SpreadsheetSerial).unwrap();

        assert_eq!(
            datetime_millis(&coerced).unwrap(),
            vec![Some(JAN_1_2023), Some(JAN_1_2023 + 86_400_000)]
        );
    }

    #[test]
    fn test_coerce_datetime_units() {
        let micros = Series::new("t".into(), &[JAN_1_2023 * 1_000])
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
            .unwrap();
        let coerced = coerce_to_timestamps(&micros, FloatEpoch::UnixMillis).unwrap();
        assert_eq!(datetime_millis(&coerced).unwrap(), vec![Some(JAN_1_2023)]);
    }

    #[test]
    fn test_coerce_unsupported_dtype_is_all_null() {
        let series = Series::new("flag".into(), &[true, false]);
        let coerced = coerce_to_timestamps(&series, FloatEpoch::UnixMillis).unwrap();
        assert_eq!(coerced.null_count(), 2);
    }
}
