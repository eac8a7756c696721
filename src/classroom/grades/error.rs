use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, GradeError>;

/// Error type covering the different failure cases that can occur when the
/// tool ingests exports, merges them into a gradebook, or adjusts grades.
#[derive(Debug, Error)]
pub enum GradeError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when a CSV file cannot be parsed or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when the configuration file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when no header matches the requested column name.
    #[error("no column named '{0}'")]
    ColumnNotFound(String),

    /// Raised when an export lacks one of the columns an ingestion needs.
    #[error("required column '{column}' missing from {}", path.display())]
    RequiredColumnMissing { column: String, path: PathBuf },

    /// Raised when merging an assignment the gradebook already holds.
    #[error("the assignment '{0}' already exists in the gradebook")]
    AssignmentAlreadyExists(String),

    /// Raised when an assignment name cannot be used as a file name.
    #[error("invalid assignment name '{0}'")]
    InvalidAssignmentName(String),

    /// Raised when a transform targets an assignment the gradebook lacks.
    #[error("the assignment '{0}' does not exist in the gradebook")]
    AssignmentNotFound(String),

    /// Raised when curving an assignment nobody has a score for.
    #[error("the assignment '{0}' has no graded scores")]
    NoGradedScores(String),

    /// Raised when a score cell does not hold a number.
    #[error("invalid score '{value}' in column {column} for '{username}'")]
    InvalidScore {
        column: String,
        username: String,
        value: String,
    },

    /// Raised when a folder move or copy would overwrite an existing path.
    #[error("destination already exists: {0}")]
    DestinationConflict(PathBuf),

    /// Raised when a period is moved onto its own location.
    #[error("destination is the same as the current location: {0}")]
    SameLocation(PathBuf),

    /// Raised when the user provides a path that does not exist.
    #[error("input not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when an export file has an extension we cannot read.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
