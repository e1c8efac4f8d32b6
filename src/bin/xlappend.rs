//! Command line entry point.
//!
//! Usage:
//!   xlappend                          # run under the current directory
//!   xlappend --root /data/payroll     # master_data/ and employee_files/ under /data/payroll
//!   xlappend --master m.xlsx --json   # explicit master, JSON report on stdout

use clap::Parser;
use std::process::ExitCode;

use xlappend::config::{Cli, Config};
use xlappend::logging::init_logging;
use xlappend::pipeline;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = config.ensure_dirs() {
        eprintln!("Error creating directories: {e}");
        return ExitCode::FAILURE;
    }

    // Flushes the log file on drop
    let _guard = match init_logging(&config.log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Starting data automation; see the log in {}", config.log_dir.display());

    let report = match pipeline::run(&config) {
        Ok(report) => report,
        Err(_) => return ExitCode::FAILURE,
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
