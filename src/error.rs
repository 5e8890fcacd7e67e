use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool loads, merges, or exports attendance workbooks.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when an input payload is not a readable spreadsheet container.
    /// The whole batch is aborted.
    #[error("unreadable workbook '{source_name}': {reason}")]
    UnreadableWorkbook { source_name: String, reason: String },

    /// Raised when no files were supplied or every supplied sheet is empty.
    #[error("no attendance data to merge: no files supplied or every sheet is empty")]
    EmptyInput,

    /// Raised when the exporter meets a value the output format cannot hold.
    #[error("cannot serialize column '{column}' at record {row}: {reason}")]
    Serialization {
        column: String,
        row: usize,
        reason: String,
    },

    /// Raised when a reporting period ends before it starts.
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
