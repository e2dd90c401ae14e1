//! faxqueue - command-line producer for the fax job spool
//!
//! # Usage
//!
//! ```bash
//! # Queue a document for one recipient
//! faxqueue submit --src fax1 --file scan.pdf --name "Clinic A" --number 0231555
//!
//! # Poll the live status
//! faxqueue status
//!
//! # Flag a job for cancellation
//! faxqueue cancel JOB-20260213-101500-a1b2c3 processing
//! ```
//!
//! Results are printed as JSON on stdout; logs go to stderr.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;
mod error;

use args::Cli;
use error::{CliError, Result};

fn init_logging(cli: &Cli) -> Result<()> {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    if cli.json_logs {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json());
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| CliError::Logging(e.to_string()))?;
    } else {
        let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| CliError::Logging(e.to_string()))?;
    }

    // Library code logs through the `log` facade.
    tracing_log::LogTracer::init().map_err(|e| CliError::Logging(e.to_string()))?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Reported(summary)) => {
            log::warn!("{}", summary);
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
