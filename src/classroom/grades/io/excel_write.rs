use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::classroom::grades::error::Result;
use crate::classroom::grades::model::{Roster, USERNAME_COLUMN};

/// Name of the single worksheet holding the exported gradebook.
pub const GRADEBOOK_SHEET: &str = "Gradebook";

/// Writes the roster to an Excel workbook. Scores are stored as numbers and
/// missing scores are left blank.
pub fn write_roster(path: &Path, roster: &Roster) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    let worksheet = workbook_writer.add_worksheet();
    worksheet.set_name(GRADEBOOK_SHEET)?;

    worksheet.write_string(0, 0, USERNAME_COLUMN)?;
    for (col_idx, assignment) in roster.assignments().iter().enumerate() {
        worksheet.write_string(0, (col_idx + 1) as u16, assignment)?;
    }

    for (row_idx, row) in roster.rows().iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        worksheet.write_string(excel_row, 0, &row.username)?;
        for (col_idx, score) in row.scores.iter().enumerate() {
            if let Some(score) = score {
                worksheet.write_number(excel_row, (col_idx + 1) as u16, *score)?;
            }
        }
    }

    // A table needs at least one data row.
    if !roster.is_empty() {
        let mut excel_table = rust_xlsxwriter::Table::new();
        excel_table.set_autofilter(true);
        let col_end = roster.assignments().len() as u16;
        worksheet.add_table(0, 0, roster.len() as u32, col_end, &excel_table)?;
    }

    workbook_writer.save(path)?;
    Ok(())
}
