//! Data types for workbooks, master records and run reports.

mod cell;
mod record;
mod report;
mod workbook;

pub use cell::*;
pub use record::*;
pub use report::*;
pub use workbook::*;
