//! Spreadsheet loader (`.xlsx`, `.xls`, `.xlsm`, `.ods`).
//!
//! The first row holds the headers. The first column is the key and each of
//! its cells is read as a timestamp on its own. Every other column is typed
//! from its non-empty cells: all integers become `Int64`, any mix of numbers
//! becomes `Float64`, date cells become `Datetime(ms)`, booleans become
//! `Boolean`, and anything else falls back to `String`.

use super::promote_first_column;
use super::timestamps::{FloatEpoch, parse_timestamp, serial_to_millis};
use crate::error::LoadError;
use crate::table::TimeTable;
use crate::utils::datetime_series;
use calamine::{Data, Range, Reader, open_workbook_auto};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Read one sheet of a workbook; the first column becomes the key.
pub(crate) fn load_spreadsheet(path: &Path, sheet_index: usize) -> Result<TimeTable, LoadError> {
    let spreadsheet_error = |reason: String| LoadError::Spreadsheet {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(sheet_index)
        .ok_or_else(|| spreadsheet_error(format!("sheet {} does not exist", sheet_index)))?
        .map_err(|e| spreadsheet_error(e.to_string()))?;

    let frame = frame_from_range(&range)?;
    debug!("Read spreadsheet {:?} sheet {}: {:?}", path, sheet_index, frame.shape());
    promote_first_column(frame, FloatEpoch::SpreadsheetSerial)
}

/// Build a DataFrame from a cell range whose first row is the header.
pub(crate) fn frame_from_range(range: &Range<Data>) -> PolarsResult<DataFrame> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let body: Vec<&[Data]> = rows.collect();

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(header.len());
    for (idx, cell) in header.iter().enumerate() {
        let mut name = match render_cell(cell) {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => format!("column_{}", idx),
        };
        if !seen.insert(name.clone()) {
            name = format!("{}_{}", name, idx);
            seen.insert(name.clone());
        }

        let cells: Vec<&Data> = body
            .iter()
            .map(|row| row.get(idx).unwrap_or(&Data::Empty))
            .collect();
        let series = if idx == 0 {
            key_column(name.into(), &cells)?
        } else {
            build_column(name.into(), &cells)?
        };
        columns.push(series.into_column());
    }

    DataFrame::new(columns)
}

/// Numbers are serial days; text goes through the timestamp parser. A cell
/// that fits neither is a missing key without affecting its neighbours.
fn key_column(name: PlSmallStr, cells: &[&Data]) -> PolarsResult<Series> {
    let millis: Vec<Option<i64>> = cells
        .iter()
        .map(|c| match c {
            Data::Float(v) => serial_to_millis(*v),
            Data::Int(v) => serial_to_millis(*v as f64),
            Data::DateTime(dt) => serial_to_millis(dt.as_f64()),
            Data::String(s) | Data::DateTimeIso(s) => parse_timestamp(s),
            _ => None,
        })
        .collect();
    datetime_series(name, millis)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Int,
    Float,
    DateTime,
    Bool,
    Text,
}

fn cell_type(cell: &Data) -> Option<CellType> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Int(_) => Some(CellType::Int),
        Data::Float(_) => Some(CellType::Float),
        Data::DateTime(_) | Data::DateTimeIso(_) => Some(CellType::DateTime),
        Data::Bool(_) => Some(CellType::Bool),
        _ => Some(CellType::Text),
    }
}

/// Widest type able to hold every non-empty cell.
fn column_type(cells: &[&Data]) -> CellType {
    cells
        .iter()
        .filter_map(|c| cell_type(c))
        .reduce(|acc, t| match (acc, t) {
            (a, b) if a == b => a,
            (CellType::Int, CellType::Float) | (CellType::Float, CellType::Int) => CellType::Float,
            _ => CellType::Text,
        })
        .unwrap_or(CellType::Text)
}

fn build_column(name: PlSmallStr, cells: &[&Data]) -> PolarsResult<Series> {
    let series = match column_type(cells) {
        CellType::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    Data::Int(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellType::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|c| match c {
                    Data::Int(v) => Some(*v as f64),
                    Data::Float(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellType::DateTime => {
            let millis: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    Data::DateTime(dt) => serial_to_millis(dt.as_f64()),
                    Data::DateTimeIso(s) => parse_timestamp(s),
                    _ => None,
                })
                .collect();
            datetime_series(name, millis)?
        }
        CellType::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    Data::Bool(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        CellType::Text => {
            let values: Vec<Option<String>> = cells.iter().map(|c| render_cell(c)).collect();
            Series::new(name, values)
        }
    };
    Ok(series)
}

fn render_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Int(v) => Some(v.to_string()),
        Data::Float(v) => Some(v.to_string()),
        Data::Bool(v) => Some(v.to_string()),
        Data::DateTime(dt) => Some(dt.as_f64().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::datetime_millis;

    fn sample_range() -> Range<Data> {
        let mut range = Range::new((0, 0), (3, 3));
        range.set_value((0, 0), Data::String("date".to_string()));
        range.set_value((0, 1), Data::String("price".to_string()));
        range.set_value((0, 2), Data::String("".to_string()));
        range.set_value((0, 3), Data::String("label".to_string()));

        for (row, serial) in [(1u32, 44_927.0), (2, 44_928.0), (3, 44_929.0)] {
            range.set_value((row, 0), Data::Float(serial));
        }
        range.set_value((1, 1), Data::Int(10));
        range.set_value((2, 1), Data::Float(10.5));
        range.set_value((1, 2), Data::Int(1));
        range.set_value((2, 2), Data::Int(2));
        range.set_value((3, 2), Data::Int(3));
        range.set_value((1, 3), Data::String("a".to_string()));
        range.set_value((2, 3), Data::Int(7));
        range
    }

    #[test]
    fn test_frame_from_range_types_columns() {
        let frame = frame_from_range(&sample_range()).unwrap();

        assert_eq!(
            frame.get_column_names_str(),
            vec!["date", "price", "column_2", "label"]
        );
        assert!(matches!(
            frame.column("date").unwrap().dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, None)
        ));
        assert_eq!(frame.column("price").unwrap().dtype(), &DataType::Float64);
        assert_eq!(frame.column("price").unwrap().null_count(), 1);
        assert_eq!(frame.column("column_2").unwrap().dtype(), &DataType::Int64);
        assert_eq!(frame.column("label").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_serial_key_becomes_timestamps() {
        let frame = frame_from_range(&sample_range()).unwrap();
        let table = promote_first_column(frame, FloatEpoch::SpreadsheetSerial).unwrap();

        assert_eq!(
            table.timestamps().unwrap(),
            vec![
                Some(1_672_531_200_000),
                Some(1_672_617_600_000),
                Some(1_672_704_000_000)
            ]
        );
        assert_eq!(table.value_columns(), vec!["price", "column_2", "label"]);
    }

    #[test]
    fn test_iso_datetime_cells() {
        let mut range = Range::new((0, 0), (1, 0));
        range.set_value((0, 0), Data::String("when".to_string()));
        range.set_value((1, 0), Data::DateTimeIso("2023-01-01T00:00:00".to_string()));

        let frame = frame_from_range(&range).unwrap();
        let when = frame.column("when").unwrap().as_materialized_series();
        assert_eq!(datetime_millis(when).unwrap(), vec![Some(1_672_531_200_000)]);
    }

    #[test]
    fn test_text_cell_in_key_only_loses_its_row() {
        let mut range = Range::new((0, 0), (4, 1));
        range.set_value((0, 0), Data::String("date".to_string()));
        range.set_value((0, 1), Data::String("v".to_string()));
        range.set_value((1, 0), Data::Float(44_927.0));
        range.set_value((2, 0), Data::Float(44_928.0));
        range.set_value((3, 0), Data::String("n/a".to_string()));
        range.set_value((4, 0), Data::String("2023-01-04".to_string()));
        for row in 1..=4u32 {
            range.set_value((row, 1), Data::Int(i64::from(row)));
        }

        let frame = frame_from_range(&range).unwrap();
        let table = promote_first_column(frame, FloatEpoch::SpreadsheetSerial).unwrap();

        assert_eq!(
            table.timestamps().unwrap(),
            vec![
                Some(1_672_531_200_000),
                Some(1_672_617_600_000),
                None,
                Some(1_672_790_400_000)
            ]
        );
    }

    #[test]
    fn test_missing_workbook_is_spreadsheet_error() {
        let err = load_spreadsheet(Path::new("/nonexistent/book.xlsx"), 0).unwrap_err();
        assert!(matches!(err, LoadError::Spreadsheet { .. }));
    }
}
