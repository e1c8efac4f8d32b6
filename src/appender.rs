//! Per-employee append step.
//!
//! Each partition is handled on its own: nothing that goes wrong here stops
//! the run. The employee file is replaced atomically, so a failed attempt
//! leaves it exactly as it was.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Result, XlappendError};
use crate::export::{append_to_sheet, AppendedWorkbook};
use crate::types::{EmployeeOutcome, MasterRecord};

/// Append one employee's rows to `EMP_<id>_Report.xlsx`.
pub fn append_partition(
    config: &Config,
    emp_id: &str,
    records: &[MasterRecord],
) -> EmployeeOutcome {
    info!("Processing data for Employee ID: {emp_id}");

    let path = match config.employee_file_path(emp_id) {
        Ok(path) => path,
        Err(e) => {
            error!("ERROR appending data for Employee ID {emp_id}: {e}");
            return EmployeeOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };
    let original = match fs::read(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(
                "Employee file not found: {}. Skipping append for {emp_id}.",
                path.display()
            );
            return EmployeeOutcome::SkippedMissingFile;
        }
        Err(e) => return failed(&path, &e.into()),
    };

    let rows: Vec<_> = records.iter().map(MasterRecord::to_row).collect();
    let appended = match append_to_sheet(&original, &config.target_sheet, &rows) {
        Ok(appended) => appended,
        Err(XlappendError::SheetNotFound(sheet)) => {
            warn!(
                "Sheet '{sheet}' not found in {}. Skipping append.",
                path.display()
            );
            return EmployeeOutcome::SkippedMissingSheet;
        }
        Err(e) => return failed(&path, &e),
    };

    if let Err(e) = write_atomically(&path, &appended.bytes) {
        return failed(&path, &e);
    }

    let AppendedWorkbook {
        rows, start_row, ..
    } = appended;
    info!(
        "Successfully appended {rows} rows to {} starting at row {start_row}.",
        path.display()
    );
    EmployeeOutcome::Appended { rows, start_row }
}

fn failed(path: &Path, cause: &XlappendError) -> EmployeeOutcome {
    error!("ERROR appending data to {}: {cause}", path.display());
    EmployeeOutcome::Failed {
        reason: cause.to_string(),
    }
}

/// Write `bytes` to a sibling temp file and rename it over `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())?;
    }
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}
