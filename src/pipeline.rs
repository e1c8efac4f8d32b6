//! One full run: discover, load, partition, append, report.

use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

use crate::appender::append_partition;
use crate::config::Config;
use crate::error::{Result, XlappendError};
use crate::loader::load_master;
use crate::partition::partition_by_employee;
use crate::types::{OutcomeKind, RunReport};

/// Pick the master workbook.
///
/// An explicit path wins. Otherwise the master directory must hold exactly
/// one `*.xlsx` file; Excel lock files (`~$...`) are ignored.
pub fn discover_master(config: &Config) -> Result<PathBuf> {
    if let Some(path) = &config.master_file {
        return Ok(path.clone());
    }

    let dir = &config.master_dir;
    let pattern = format!(
        "{}/*.xlsx",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let entries =
        glob::glob(&pattern).map_err(|e| XlappendError::Config(format!("bad master glob: {e}")))?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .filter(|p| fs::metadata(p).map(|m| m.is_file()).unwrap_or(false))
        .filter(|p| {
            !p.file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with("~$"))
        })
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(XlappendError::NoMasterFile(dir.clone())),
        1 => Ok(candidates.remove(0)),
        _ => Err(XlappendError::AmbiguousMaster {
            dir: dir.clone(),
            candidates,
        }),
    }
}

/// Run the pipeline once.
///
/// Fatal errors (no master, unreadable master) are logged and returned;
/// per-employee problems end up in the report.
pub fn run(config: &Config) -> Result<RunReport> {
    info!("--- Starting Data Automation Process ---");

    let master = discover_master(config).map_err(|e| {
        error!("FATAL ERROR: {e}. Exiting.");
        e
    })?;
    // load_master logs its own failures
    let set = load_master(&master).map_err(|e| {
        info!("Master data unavailable. Exiting.");
        e
    })?;

    let mut report = RunReport {
        master: set.source,
        total_rows: set.records.len(),
        ..RunReport::default()
    };
    for (emp_id, records) in partition_by_employee(set.records) {
        let outcome = append_partition(config, &emp_id, &records);
        report.outcomes.insert(emp_id, outcome);
    }

    info!("--- Process Complete ---");
    info!("Total employee files processed: {}", report.attempted());
    info!(
        "{} rows appended; {}: {}, {}: {}, {}: {}, {}: {}",
        report.appended_rows(),
        OutcomeKind::Appended,
        report.count(OutcomeKind::Appended),
        OutcomeKind::SkippedMissingFile,
        report.count(OutcomeKind::SkippedMissingFile),
        OutcomeKind::SkippedMissingSheet,
        report.count(OutcomeKind::SkippedMissingSheet),
        OutcomeKind::Failed,
        report.count(OutcomeKind::Failed),
    );

    Ok(report)
}
