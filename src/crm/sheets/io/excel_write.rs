use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::crm::sheets::error::Result;
use crate::crm::sheets::export::{ExportValue, WorkbookData};

/// Writes the provided workbook data to the given path.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = build_writer(workbook)?;
    workbook_writer.save(path)?;
    Ok(())
}

/// Serialises the workbook data into xlsx bytes.
pub fn workbook_to_bytes(workbook: &WorkbookData) -> Result<Vec<u8>> {
    let mut workbook_writer = build_writer(workbook)?;
    Ok(workbook_writer.save_to_buffer()?)
}

fn build_writer(workbook: &WorkbookData) -> Result<Workbook> {
    let mut workbook_writer = Workbook::new();

    for table in &workbook.tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;

        for (col_idx, header) in table.columns.iter().enumerate() {
            worksheet.write_string(0, col_idx as u16, header)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            let row_number = (row_idx + 1) as u32;
            for (col_idx, cell) in row.iter().enumerate() {
                let col = col_idx as u16;
                match cell {
                    ExportValue::Text(value) => {
                        worksheet.write_string(row_number, col, value)?;
                    }
                    ExportValue::Number(value) => {
                        worksheet.write_number(row_number, col, *value)?;
                    }
                    ExportValue::Blank => {}
                }
            }
        }

        if table.frozen_columns > 0 {
            worksheet.set_freeze_panes(1, table.frozen_columns)?;
        }

        if table.autofilter && !table.rows.is_empty() {
            let col_end = (table.columns.len() as u16).saturating_sub(1);
            worksheet.autofilter(0, 0, table.rows.len() as u32, col_end)?;
        }
    }

    Ok(workbook_writer)
}
