//! xlappend - append master payroll rows to per-employee XLSX reports
//!
//! One run:
//! - loads the master workbook and normalizes its headers
//! - groups the rows by EmpID
//! - appends each group to `EMP_<id>_Report.xlsx`, sheet `Raw_Data`
//! - returns a [`RunReport`] with one outcome per employee
//!
//! Employee workbooks are patched in place at the ZIP level: only the target
//! worksheet part is rewritten, every other part is copied byte for byte.
//!
//! # Usage
//!
//! ```no_run
//! use xlappend::{pipeline, Config};
//!
//! let config = Config::from_root(".");
//! let report = pipeline::run(&config)?;
//! println!("{} rows appended", report.appended_rows());
//! # Ok::<(), xlappend::XlappendError>(())
//! ```

// Workbook reading and patching
pub mod cell_ref;
pub mod error;
pub mod export;
pub mod numfmt;
pub mod parser;
pub mod types;
pub mod xml_helpers;

// Pipeline stages
pub mod appender;
pub mod config;
pub mod loader;
pub mod logging;
pub mod partition;
pub mod pipeline;

pub use config::Config;
pub use error::{Result, XlappendError};
pub use types::*;
