//! Format loaders.
//!
//! Each loader reads one file format into a polars `DataFrame` and then
//! promotes the first column to the temporal key:
//!
//! - **Delimited text** and **spreadsheets**: the first column is the index and
//!   is coerced to timestamps in place.
//! - **Row JSON** and **columnar binary**: the first column *by position* after
//!   load is converted to timestamps, removed from the value columns and
//!   promoted to the index.
//!
//! Both paths end in [`promote_first_column`]; the positional rule is part of
//! the contract for every format. Rows whose key fails coercion keep a null key.

mod columnar;
mod delimited;
mod json;
mod spreadsheet;
pub(crate) mod timestamps;

pub(crate) use columnar::load_columnar;
pub(crate) use delimited::load_delimited;
pub(crate) use json::load_row_json;
pub(crate) use spreadsheet::load_spreadsheet;

use crate::error::LoadError;
use crate::table::TimeTable;
use polars::prelude::*;
use std::path::Path;
use timestamps::{FloatEpoch, coerce_to_timestamps};
use tracing::debug;

/// Turn the first column of `frame` into the temporal key.
///
/// Fails if the frame has no columns or if not a single key can be coerced.
pub(crate) fn promote_first_column(
    frame: DataFrame,
    floats: FloatEpoch,
) -> Result<TimeTable, LoadError> {
    let Some(first) = frame.get_columns().first() else {
        return Err(LoadError::NoColumns);
    };

    let raw_key = first.as_materialized_series().clone();
    let key_name = raw_key.name().to_string();
    let key = coerce_to_timestamps(&raw_key, floats)?;

    let missing = key.null_count();
    if missing == key.len() {
        return Err(LoadError::NoTemporalKey { column: key_name });
    }
    if missing > 0 {
        debug!(
            "{} of {} rows in '{}' have no valid timestamp",
            missing,
            key.len(),
            key_name
        );
    }

    let values = frame.drop(&key_name)?;
    Ok(TimeTable::from_parts(key, values)?)
}

/// Map an I/O failure on `path` to a [`LoadError`].
pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> LoadError {
    let path = path.to_path_buf();
    move |source| LoadError::Io { path, source }
}

/// Map a polars parse failure on `path` to a [`LoadError`].
pub(crate) fn parse_error(path: &Path) -> impl FnOnce(PolarsError) -> LoadError {
    let path = path.to_path_buf();
    move |e| LoadError::Parse {
        path,
        reason: e.to_string(),
    }
}
