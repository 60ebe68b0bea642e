//! Delimited-text (CSV/TSV) loader.

use super::timestamps::FloatEpoch;
use super::{io_error, parse_error, promote_first_column};
use crate::config::PreprocessConfig;
use crate::error::LoadError;
use crate::table::TimeTable;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Read a delimited-text file whose first column is the timestamp index.
///
/// A header row is required. `.tsv` files are always read tab-separated.
pub(crate) fn load_delimited(
    path: &Path,
    config: &PreprocessConfig,
) -> Result<TimeTable, LoadError> {
    let separator = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => config.separator_byte(),
    };

    let file = File::open(path).map_err(io_error(path))?;
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(config.infer_schema_length)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_quote_char(Some(b'"')),
        )
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(parse_error(path))?;

    debug!("Read delimited text {:?}: {:?}", path, frame.shape());
    promote_first_column(frame, FloatEpoch::UnixMillis)
}
