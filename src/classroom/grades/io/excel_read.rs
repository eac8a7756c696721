use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};

use crate::classroom::grades::error::{GradeError, Result};
use crate::classroom::grades::model::RawTable;

/// Reads the first worksheet of an `.xlsx` export into a [`RawTable`]. The
/// first row is taken as the header row.
pub fn read_raw_table(path: &Path) -> Result<RawTable> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| GradeError::UnsupportedFormat(path.to_path_buf()))?;
    let range = read_required_sheet(&mut workbook, &sheet, path)?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell_to_string(Some(cell))).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    Ok(RawTable::new(headers, rows.collect()))
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
    path: &Path,
) -> Result<calamine::Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| GradeError::UnsupportedFormat(path.to_path_buf()))?;
    let range = range_result.map_err(GradeError::from)?;
    Ok(range)
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
