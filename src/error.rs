//! Structured error types for xlappend.
//!
//! Only failures that abort a run (or a single package read/patch) are
//! errors. Per-employee skips and failures are reported as
//! [`EmployeeOutcome`](crate::types::EmployeeOutcome) values instead.

use std::path::PathBuf;

/// All errors that can occur while reading, loading or patching workbooks.
#[derive(Debug, thiserror::Error)]
pub enum XlappendError {
    /// The master workbook does not exist.
    #[error("master data file not found at {}", .0.display())]
    MasterFileNotFound(PathBuf),

    /// The master workbook exists but could not be turned into records.
    #[error("master data processing failed for {}: {reason}", .path.display())]
    MasterProcessing { path: PathBuf, reason: String },

    /// No `*.xlsx` file in the master data directory.
    #[error("no master data workbook found in {}", .0.display())]
    NoMasterFile(PathBuf),

    /// More than one candidate master workbook; selection must be explicit.
    #[error("multiple master data workbooks found in {}: {}", .dir.display(), list_paths(.candidates))]
    AmbiguousMaster {
        dir: PathBuf,
        candidates: Vec<PathBuf>,
    },

    /// Invalid configuration (paths, file name pattern, logging setup).
    #[error("configuration: {0}")]
    Config(String),

    /// An EmpID that would not name a file inside the employee directory.
    #[error("employee ID '{0}' cannot be used in a file name")]
    UnsafeEmpId(String),

    /// Required columns are absent after header normalization.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// The workbook has no sheet with the requested name.
    #[error("sheet '{0}' not found")]
    SheetNotFound(String),

    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XlappendError>;

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<tempfile::PersistError> for XlappendError {
    fn from(e: tempfile::PersistError) -> Self {
        Self::Io(e.error)
    }
}

impl From<std::string::FromUtf8Error> for XlappendError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Parse(e.to_string())
    }
}
