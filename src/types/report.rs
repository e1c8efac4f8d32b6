use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// What happened to one employee partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum EmployeeOutcome {
    /// Rows were written; `start_row` is the 1-based sheet row of the first one.
    Appended { rows: usize, start_row: u32 },
    /// `EMP_<id>_Report.xlsx` does not exist.
    SkippedMissingFile,
    /// The file exists but has no target sheet.
    SkippedMissingSheet,
    /// Open, read or write failed; the file was left as it was.
    Failed { reason: String },
}

impl EmployeeOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Appended { .. } => OutcomeKind::Appended,
            Self::SkippedMissingFile => OutcomeKind::SkippedMissingFile,
            Self::SkippedMissingSheet => OutcomeKind::SkippedMissingSheet,
            Self::Failed { .. } => OutcomeKind::Failed,
        }
    }

    pub fn appended_rows(&self) -> usize {
        match self {
            Self::Appended { rows, .. } => *rows,
            _ => 0,
        }
    }
}

/// Fieldless mirror of [`EmployeeOutcome`] for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Appended,
    SkippedMissingFile,
    SkippedMissingSheet,
    Failed,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Appended => "appended",
            Self::SkippedMissingFile => "skipped (missing file)",
            Self::SkippedMissingSheet => "skipped (missing sheet)",
            Self::Failed => "failed",
        })
    }
}

/// Aggregated result of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub master: PathBuf,
    /// Cleaned master rows.
    pub total_rows: usize,
    /// Outcome per EmpID, in processing order.
    pub outcomes: BTreeMap<String, EmployeeOutcome>,
}

impl RunReport {
    /// Number of partitions the appender was invoked for.
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn appended_rows(&self) -> usize {
        self.outcomes.values().map(EmployeeOutcome::appended_rows).sum()
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes.values().filter(|o| o.kind() == kind).count()
    }

    pub fn outcome(&self, emp_id: &str) -> Option<&EmployeeOutcome> {
        self.outcomes.get(emp_id)
    }
}
