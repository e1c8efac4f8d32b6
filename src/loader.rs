//! Master data loading and cleaning.
//!
//! All-or-nothing: either every row of the first sheet becomes a
//! [`MasterRecord`] or the load fails.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{error, info};

use crate::error::{Result, XlappendError};
use crate::parser::read_first_sheet;
use crate::types::{CellValue, MasterRecord, MasterRecordSet, REQUIRED_COLUMNS};

/// Header spelling accepted as an alias of `EmpID`.
const EMPLOYEE_ID_ALIAS: &str = "Employee_ID";

/// Trim a header and replace internal spaces with underscores.
pub fn normalize_header(header: &str) -> String {
    header.trim().replace(' ', "_")
}

/// Canonical EmpID: string form, uppercased, trimmed. Idempotent.
pub fn normalize_emp_id(value: &CellValue) -> String {
    normalize_emp_id_str(&value.to_string())
}

/// [`normalize_emp_id`] for an already stringified value.
pub fn normalize_emp_id_str(value: &str) -> String {
    value.to_uppercase().trim().to_string()
}

/// Load and clean the master workbook at `path`.
///
/// Errors are logged here; callers only decide whether to stop.
pub fn load_master(path: &Path) -> Result<MasterRecordSet> {
    info!("Attempting to load master data from: {}", path.display());

    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error!(
                "FATAL ERROR: Master data file not found at {}",
                path.display()
            );
            return Err(XlappendError::MasterFileNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(processing_error(path, &XlappendError::Io(e))),
    };

    match clean_master(&data) {
        Ok(records) => {
            info!(
                "Master data loaded successfully. Total rows: {}",
                records.len()
            );
            Ok(MasterRecordSet {
                source: path.to_path_buf(),
                records,
            })
        }
        Err(e) => Err(processing_error(path, &e)),
    }
}

fn processing_error(path: &Path, cause: &XlappendError) -> XlappendError {
    error!("An error occurred during master data processing: {cause}");
    XlappendError::MasterProcessing {
        path: path.to_path_buf(),
        reason: cause.to_string(),
    }
}

/// Turn raw XLSX bytes into cleaned records.
pub fn clean_master(data: &[u8]) -> Result<Vec<MasterRecord>> {
    let sheet = read_first_sheet(data)?;
    let mut rows = sheet.dense_rows().into_iter();

    let Some(header_row) = rows.next() else {
        return Err(XlappendError::MissingColumns(
            REQUIRED_COLUMNS.iter().map(ToString::to_string).collect(),
        ));
    };

    let headers: Vec<String> = header_row
        .iter()
        .map(|h| {
            let name = normalize_header(&h.to_string());
            if name == EMPLOYEE_ID_ALIAS {
                "EmpID".to_string()
            } else {
                name
            }
        })
        .collect();

    // Only a clash between required columns is ambiguous
    let mut seen = HashSet::new();
    for name in headers.iter().filter(|h| REQUIRED_COLUMNS.contains(&h.as_str())) {
        if !seen.insert(name.as_str()) {
            return Err(XlappendError::Parse(format!(
                "duplicate column '{name}' after header normalization"
            )));
        }
    }

    let position = |name: &str| headers.iter().position(|h| h == name);
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|&&c| position(c).is_none())
        .map(ToString::to_string)
        .collect();
    let (Some(emp_col), Some(date_col), Some(component_col), Some(amount_col)) = (
        position("EmpID"),
        position("Date"),
        position("Pay_Component"),
        position("Amount"),
    ) else {
        return Err(XlappendError::MissingColumns(missing));
    };

    let mut records = Vec::new();
    for (idx, row) in rows.enumerate() {
        if row.iter().all(CellValue::is_blank) {
            continue;
        }
        let cell = |col: usize| row.get(col).cloned().unwrap_or_default();

        let emp_id = normalize_emp_id(&cell(emp_col));
        if emp_id.is_empty() {
            return Err(XlappendError::Parse(format!(
                "data row {} has no EmpID",
                idx + 1
            )));
        }

        records.push(MasterRecord {
            emp_id,
            date: cell(date_col),
            pay_component: cell(component_col),
            amount: cell(amount_col),
        });
    }

    Ok(records)
}
