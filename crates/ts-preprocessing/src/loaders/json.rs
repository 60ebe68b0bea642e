//! Row-oriented JSON loader.

use super::timestamps::FloatEpoch;
use super::{io_error, parse_error, promote_first_column};
use crate::error::LoadError;
use crate::table::TimeTable;
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Pick the JSON layout from the first non-blank byte.
///
/// A document starting with `[` is an array of records; anything else is read
/// as newline-delimited records.
fn detect_layout(bytes: &[u8]) -> JsonFormat {
    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'[') => JsonFormat::Json,
        _ => JsonFormat::JsonLines,
    }
}

/// Read JSON records; the first field by position becomes the key.
pub(crate) fn load_row_json(path: &Path) -> Result<TimeTable, LoadError> {
    let bytes = std::fs::read(path).map_err(io_error(path))?;
    let layout = detect_layout(&bytes);

    let frame = JsonReader::new(Cursor::new(bytes))
        .with_json_format(layout)
        .finish()
        .map_err(parse_error(path))?;

    debug!("Read row JSON {:?}: {:?}", path, frame.shape());
    promote_first_column(frame, FloatEpoch::UnixMillis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_layout() {
        assert!(matches!(detect_layout(b"  \n[{\"a\": 1}]"), JsonFormat::Json));
        assert!(matches!(
            detect_layout(b"{\"a\": 1}\n{\"a\": 2}"),
            JsonFormat::JsonLines
        ));
        assert!(matches!(detect_layout(b""), JsonFormat::JsonLines));
    }
}
