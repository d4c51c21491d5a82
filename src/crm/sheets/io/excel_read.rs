use std::io::Cursor;
use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx};

use crate::crm::sheets::error::{Result, SheetError};
use crate::crm::sheets::model::{RawCell, Sheet};

/// Reads the first worksheet of an xlsx payload.
///
/// Cells keep their spreadsheet coordinates: leading empty columns are padded
/// with blanks and [`Sheet::first_row`] records where the used range starts.
pub fn read_first_sheet(bytes: &[u8]) -> Result<Sheet> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetError::EmptyWorkbook)??;
    sheet_from_range(&range)
}

/// Reads the first worksheet of an xlsx file on disk.
pub fn read_sheet_file(path: &Path) -> Result<Sheet> {
    let bytes = std::fs::read(path)?;
    read_first_sheet(&bytes)
}

fn sheet_from_range(range: &Range<DataType>) -> Result<Sheet> {
    let Some((start_row, start_column)) = range.start() else {
        return Err(SheetError::EmptyWorkbook);
    };
    if range.is_empty() {
        return Err(SheetError::EmptyWorkbook);
    }

    let padding = start_column as usize;
    let rows = range
        .rows()
        .map(|row| {
            let mut cells = vec![RawCell::Blank; padding];
            cells.extend(row.iter().map(cell_to_raw));
            cells
        })
        .collect();

    Ok(Sheet {
        first_row: start_row as usize + 1,
        rows,
    })
}

fn cell_to_raw(cell: &DataType) -> RawCell {
    match cell {
        DataType::String(value) => RawCell::Text(value.clone()),
        DataType::Float(value) | DataType::DateTime(value) => RawCell::Number(*value),
        DataType::Int(value) => RawCell::Number(*value as f64),
        DataType::Bool(value) => RawCell::Bool(*value),
        DataType::Empty => RawCell::Blank,
        other => RawCell::Text(other.to_string()),
    }
}
