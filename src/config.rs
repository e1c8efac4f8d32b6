//! Run configuration: command line flags with environment fallbacks.

use clap::Parser;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, XlappendError};

/// Sheet that receives appended rows in every employee file.
pub const DEFAULT_SHEET: &str = "Raw_Data";
/// Employee file name; `{id}` is replaced by the normalized EmpID.
pub const DEFAULT_FILE_PATTERN: &str = "EMP_{id}_Report.xlsx";
pub const MASTER_DATA_DIR: &str = "master_data";
pub const EMPLOYEE_FILES_DIR: &str = "employee_files";

#[derive(Debug, Parser)]
#[command(name = "xlappend")]
#[command(about = "Append master payroll rows to per-employee XLSX reports")]
#[command(version)]
pub struct Cli {
    /// Base directory; the other directories default to children of it.
    #[arg(long, env = "XLAPPEND_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Master workbook to load instead of scanning the master directory.
    #[arg(long, env = "XLAPPEND_MASTER")]
    pub master: Option<PathBuf>,

    /// Directory scanned for the master workbook [default: <root>/master_data]
    #[arg(long, env = "XLAPPEND_MASTER_DIR")]
    pub master_dir: Option<PathBuf>,

    /// Directory holding EMP_<id>_Report.xlsx files [default: <root>/employee_files]
    #[arg(long, env = "XLAPPEND_EMPLOYEE_DIR")]
    pub employee_dir: Option<PathBuf>,

    /// Sheet to append to.
    #[arg(long, env = "XLAPPEND_SHEET", default_value = DEFAULT_SHEET)]
    pub sheet: String,

    /// Employee file name pattern; must contain `{id}`.
    #[arg(long, env = "XLAPPEND_FILE_PATTERN", default_value = DEFAULT_FILE_PATTERN)]
    pub file_pattern: String,

    /// Directory for the dated run log [default: <root>]
    #[arg(long, env = "XLAPPEND_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub master_dir: PathBuf,
    /// Explicit master workbook; skips directory discovery when set.
    pub master_file: Option<PathBuf>,
    pub employee_dir: PathBuf,
    pub target_sheet: String,
    pub file_pattern: String,
    pub log_dir: PathBuf,
}

impl Config {
    /// Defaults laid out under `root`.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            master_dir: root.join(MASTER_DATA_DIR),
            master_file: None,
            employee_dir: root.join(EMPLOYEE_FILES_DIR),
            target_sheet: DEFAULT_SHEET.to_string(),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            log_dir: root.to_path_buf(),
        }
    }

    /// Build and validate a config from parsed flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let defaults = Self::from_root(&cli.root);
        let config = Self {
            master_dir: cli.master_dir.clone().unwrap_or(defaults.master_dir),
            master_file: cli.master.clone(),
            employee_dir: cli.employee_dir.clone().unwrap_or(defaults.employee_dir),
            target_sheet: cli.sheet.clone(),
            file_pattern: cli.file_pattern.clone(),
            log_dir: cli.log_dir.clone().unwrap_or(defaults.log_dir),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.file_pattern.contains("{id}") {
            return Err(XlappendError::Config(format!(
                "file pattern '{}' has no {{id}} placeholder",
                self.file_pattern
            )));
        }
        if self.file_pattern.contains(['/', '\\']) {
            return Err(XlappendError::Config(format!(
                "file pattern '{}' must be a file name, not a path",
                self.file_pattern
            )));
        }
        if self.target_sheet.trim().is_empty() {
            return Err(XlappendError::Config("target sheet name is empty".into()));
        }
        Ok(())
    }

    /// File name of an employee's report, e.g. `EMP_E1_Report.xlsx`.
    pub fn employee_file_name(&self, emp_id: &str) -> String {
        self.file_pattern.replace("{id}", emp_id)
    }

    /// Path of an employee's report inside the employee directory.
    ///
    /// Fails for IDs that would resolve anywhere else, such as `../x` or `..`.
    pub fn employee_file_path(&self, emp_id: &str) -> Result<PathBuf> {
        let name = self.employee_file_name(emp_id);
        let mut components = Path::new(&name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if !emp_id.contains(['/', '\\', '\0']) => {
                Ok(self.employee_dir.join(name))
            }
            _ => Err(XlappendError::UnsafeEmpId(emp_id.to_string())),
        }
    }

    /// Create the master and employee directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.master_dir)?;
        fs::create_dir_all(&self.employee_dir)?;
        Ok(())
    }
}
