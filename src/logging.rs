//! Run log: dated plain-text file plus console output on stderr.

use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Result, XlappendError};

/// `automation_log_YYYYMMDD.log`
pub fn log_file_name(date: NaiveDate) -> String {
    format!("automation_log_{}.log", date.format("%Y%m%d"))
}

/// Initializes logging with both console and file output.
///
/// The returned guard flushes the file writer on drop; hold it for the
/// whole run. `RUST_LOG` overrides the default `info` level.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)?;

    let file_name = log_file_name(chrono::Local::now().date_naive());
    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(non_blocking_writer);
    // stdout is reserved for the --json report
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| XlappendError::Config(format!("logging already initialized: {e}")))?;

    Ok(guard)
}
