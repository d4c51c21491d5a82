use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, SheetError>;

/// Batch-fatal failures: anything that stops an import before the first data
/// row is read, plus the I/O plumbing around imports and exports.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the settings file is not valid TOML.
    #[error("invalid settings: {0}")]
    Settings(#[from] toml::de::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// The payload could not be opened as a workbook at all.
    #[error("unable to read the Excel file: {0}")]
    UnreadableWorkbook(String),

    /// The workbook has no sheet, or its first sheet holds no rows.
    #[error("the file contains no data")]
    EmptyWorkbook,

    /// Not a single header cell resolved to a known column.
    #[error("the file has no valid headers")]
    NoValidHeaders,

    /// Required columns are absent from the header row.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl From<calamine::XlsxError> for SheetError {
    fn from(error: calamine::XlsxError) -> Self {
        SheetError::UnreadableWorkbook(error.to_string())
    }
}

/// A validation or creation failure tied to one sheet row.
///
/// Row errors never abort a batch; the aggregator collects them into the
/// import outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based row number in the source sheet (the header is row 1).
    pub row: usize,
    pub message: String,
}

impl RowError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)
    }
}

impl std::error::Error for RowError {}
