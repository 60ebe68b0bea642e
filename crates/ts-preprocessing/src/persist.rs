//! Writing tables to disk.
//!
//! The key column is written like any other column, so every output can be
//! read back by the matching loader.

use crate::error::ExportError;
use crate::table::TimeTable;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

/// Write `table` to `path`, choosing the format from the extension.
///
/// `.json`, `.jsonl`/`.ndjson` and `.parquet` are recognised; anything else is
/// written as comma-separated text.
pub fn write_table(table: &TimeTable, path: &Path) -> Result<(), ExportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "json" => write_json(table, path, JsonFormat::Json),
        "jsonl" | "ndjson" => write_json(table, path, JsonFormat::JsonLines),
        "parquet" | "pq" => write_parquet(table, path),
        _ => write_csv(table, path),
    }
}

/// Write comma-separated text with a header row.
pub fn write_csv(table: &TimeTable, path: &Path) -> Result<(), ExportError> {
    let mut file = create(path)?;
    let mut frame = table.frame().clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut frame)?;
    debug!("Wrote {} rows to {:?}", frame.height(), path);
    Ok(())
}

/// Write JSON records as an array or one object per line.
pub fn write_json(table: &TimeTable, path: &Path, layout: JsonFormat) -> Result<(), ExportError> {
    let mut file = create(path)?;
    let mut frame = table.frame().clone();
    JsonWriter::new(&mut file)
        .with_json_format(layout)
        .finish(&mut frame)?;
    debug!("Wrote {} rows to {:?}", frame.height(), path);
    Ok(())
}

pub fn write_parquet(table: &TimeTable, path: &Path) -> Result<(), ExportError> {
    let file = create(path)?;
    let mut frame = table.frame().clone();
    ParquetWriter::new(file).finish(&mut frame)?;
    debug!("Wrote {} rows to {:?}", frame.height(), path);
    Ok(())
}

/// Create `path`, making parent directories as needed.
fn create(path: &Path) -> Result<File, ExportError> {
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    File::create(path).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::datetime_series;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("ts_preprocessing_persist_{}", name));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_write_csv_creates_parent_dirs() {
        let key = datetime_series("date".into(), vec![Some(0), Some(86_400_000)]).unwrap();
        let table = TimeTable::from_parts(key, df!["v" => [1.0, 2.0]].unwrap()).unwrap();

        let path = scratch_dir("csv").join("nested").join("out.csv");
        write_table(&table, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("date,v"));
        assert_eq!(text.lines().count(), 3);
    }
}
