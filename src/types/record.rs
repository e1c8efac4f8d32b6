use serde::Serialize;
use std::path::PathBuf;

use super::CellValue;

/// Output column order of an appended row.
pub const REQUIRED_COLUMNS: [&str; 4] = ["EmpID", "Date", "Pay_Component", "Amount"];

/// One cleaned master row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterRecord {
    /// Normalized employee identifier (uppercase, trimmed, non-empty).
    pub emp_id: String,
    pub date: CellValue,
    pub pay_component: CellValue,
    pub amount: CellValue,
}

impl MasterRecord {
    /// Cell values in [`REQUIRED_COLUMNS`] order.
    pub fn to_row(&self) -> [CellValue; 4] {
        [
            CellValue::Text(self.emp_id.clone()),
            self.date.clone(),
            self.pay_component.clone(),
            self.amount.clone(),
        ]
    }
}

/// The cleaned master table, rows in source order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MasterRecordSet {
    pub source: PathBuf,
    pub records: Vec<MasterRecord>,
}

impl MasterRecordSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
