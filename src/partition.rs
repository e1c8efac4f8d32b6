//! Grouping of master rows into per-employee partitions.

use std::collections::BTreeMap;

use crate::types::MasterRecord;

/// Group records by EmpID.
///
/// Rows keep their source order inside each partition; partitions come out
/// in ascending EmpID order so runs are reproducible.
pub fn partition_by_employee(
    records: impl IntoIterator<Item = MasterRecord>,
) -> BTreeMap<String, Vec<MasterRecord>> {
    let mut partitions: BTreeMap<String, Vec<MasterRecord>> = BTreeMap::new();
    for record in records {
        partitions
            .entry(record.emp_id.clone())
            .or_default()
            .push(record);
    }
    partitions
}
