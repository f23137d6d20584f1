//! Logging setup
//!
//! Every run writes to the console and to a fresh directory under the
//! configured log root, named after the run's start time:
//!
//! - `common.log` receives everything the filter lets through
//! - `error.log` receives ERROR events only

use crate::{HarvestError, Result};
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const COMMON_LOG: &str = "common.log";
pub const ERROR_LOG: &str = "error.log";

/// Builds the event filter for the given verbosity
pub fn build_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reel_harvest=info,warn"),
            1 => EnvFilter::new("reel_harvest=debug,info"),
            2 => EnvFilter::new("reel_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    }
}

/// Creates `{log_dir}/{YYYYmmddHHMMSS}` and returns its path
pub fn create_run_dir(log_dir: &Path) -> Result<PathBuf> {
    let run_id = Local::now().format("%Y%m%d%H%M%S").to_string();
    let run_dir = log_dir.join(run_id);
    fs::create_dir_all(&run_dir)?;
    Ok(run_dir)
}

fn open_log(path: &Path) -> Result<Arc<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Arc::new(file))
}

/// Installs the global subscriber
///
/// # Arguments
///
/// * `verbose` - Number of `-v` flags
/// * `quiet` - Only errors reach any sink
/// * `log_dir` - Root under which the per-run directory is created
///
/// # Returns
///
/// * `Ok(PathBuf)` - The per-run log directory
/// * `Err(HarvestError)` - The directory or files could not be created, or a
///   subscriber was already installed
pub fn init_logging(verbose: u8, quiet: bool, log_dir: &Path) -> Result<PathBuf> {
    let run_dir = create_run_dir(log_dir)?;
    let common = open_log(&run_dir.join(COMMON_LOG))?;
    let errors = open_log(&run_dir.join(ERROR_LOG))?;

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let common_layer = tracing_subscriber::fmt::layer()
        .with_writer(common)
        .with_ansi(false)
        .with_target(false);

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(errors)
        .with_ansi(false)
        .with_target(false)
        .with_filter(LevelFilter::ERROR);

    tracing_subscriber::registry()
        .with(build_filter(verbose, quiet))
        .with(console)
        .with(common_layer)
        .with(error_layer)
        .try_init()
        .map_err(|e| HarvestError::Logging(e.to_string()))?;

    Ok(run_dir)
}
