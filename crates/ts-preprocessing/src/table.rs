//! The time-indexed working table.

use crate::utils::datetime_millis;
use polars::prelude::*;

/// A table whose first column is the temporal key.
///
/// The key column is always `Datetime(ms)`. Entries that could not be coerced to
/// a timestamp are null ("missing key") until the table is normalized.
#[derive(Debug, Clone)]
pub struct TimeTable {
    frame: DataFrame,
}

impl TimeTable {
    /// Assemble a table from a key Series and the value columns.
    ///
    /// The key is cast to `Datetime(ms)` and placed first.
    pub fn from_parts(key: Series, values: DataFrame) -> PolarsResult<Self> {
        let key = key.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        let mut columns = Vec::with_capacity(values.width() + 1);
        columns.push(key.into_column());
        columns.extend(values.get_columns().iter().cloned());
        Ok(Self {
            frame: DataFrame::new(columns)?,
        })
    }

    /// Wrap a frame whose first column is already the temporal key.
    pub fn from_frame(frame: DataFrame) -> PolarsResult<Self> {
        let Some(first) = frame.get_columns().first() else {
            return Err(PolarsError::NoData(
                "a time table needs at least the key column".into(),
            ));
        };
        let key = first.as_materialized_series().clone();
        let values = frame.drop(key.name().as_str())?;
        Self::from_parts(key, values)
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Name of the temporal key column.
    pub fn key_name(&self) -> &str {
        self.frame
            .get_columns()
            .first()
            .map(|c| c.name().as_str())
            .unwrap_or_default()
    }

    pub fn key(&self) -> PolarsResult<&Series> {
        Ok(self.frame.column(self.key_name())?.as_materialized_series())
    }

    /// Key values as epoch milliseconds.
    pub fn timestamps(&self) -> PolarsResult<Vec<Option<i64>>> {
        datetime_millis(self.key()?)
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Number of missing entries across the value columns.
    pub fn missing_count(&self) -> usize {
        self.frame
            .get_columns()
            .iter()
            .skip(1)
            .map(|c| c.null_count())
            .sum()
    }

    /// Names of every column except the key, in order.
    pub fn value_columns(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .skip(1)
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::datetime_series;

    #[test]
    fn test_from_parts_puts_key_first() {
        let key = datetime_series("date".into(), vec![Some(0), None]).unwrap();
        let values = df!["price" => [1.0, 2.0], "volume" => [10i64, 20]].unwrap();
        let table = TimeTable::from_parts(key, values).unwrap();

        assert_eq!(table.key_name(), "date");
        assert_eq!(table.value_columns(), vec!["price", "volume"]);
        assert_eq!(table.timestamps().unwrap(), vec![Some(0), None]);
        assert_eq!(table.missing_count(), 0);
    }

    #[test]
    fn test_from_frame_casts_key() {
        let frame = df!["t" => [0i64, 1_000], "v" => [1.0, 2.0]].unwrap();
        let table = TimeTable::from_frame(frame).unwrap();

        assert!(matches!(
            table.key().unwrap().dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, None)
        ));
        assert_eq!(table.timestamps().unwrap(), vec![Some(0), Some(1_000)]);
    }

    #[test]
    fn test_from_frame_rejects_empty_frame() {
        assert!(TimeTable::from_frame(DataFrame::empty()).is_err());
    }
}
