//! Columnar-binary (Parquet) loader.

use super::timestamps::FloatEpoch;
use super::{io_error, parse_error, promote_first_column};
use crate::error::LoadError;
use crate::table::TimeTable;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Read a Parquet file; the first column by position becomes the key.
pub(crate) fn load_columnar(path: &Path) -> Result<TimeTable, LoadError> {
    let file = File::open(path).map_err(io_error(path))?;
    let frame = ParquetReader::new(file)
        .finish()
        .map_err(parse_error(path))?;

    debug!("Read columnar binary {:?}: {:?}", path, frame.shape());
    promote_first_column(frame, FloatEpoch::UnixMillis)
}
