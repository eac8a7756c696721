//! File adapters: CSV and Excel tables, atomic rewrites and directory moves.

pub mod atomic;
pub mod csv_table;
pub mod excel_read;
pub mod excel_write;
pub mod tree;

use std::path::Path;

use crate::classroom::grades::error::{GradeError, Result};
use crate::classroom::grades::model::RawTable;

/// Reads a provider export, picking the reader from the file extension.
/// Anything that is not `.xlsx` is parsed as CSV.
pub fn read_export(path: &Path) -> Result<RawTable> {
    if !path.is_file() {
        return Err(GradeError::MissingInput(path.to_path_buf()));
    }
    match extension(path).as_deref() {
        Some("xlsx") => excel_read::read_raw_table(path),
        Some("xls") | Some("xlsb") | Some("ods") => {
            Err(GradeError::UnsupportedFormat(path.to_path_buf()))
        }
        _ => csv_table::read_raw_table(path),
    }
}

/// Lowercased file extension, if any.
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}
