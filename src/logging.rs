//! Logging setup for the `ljsync` binary and the test suites.
//!
//! Everything in the crate logs through `tracing`. The binary installs a
//! `tracing-subscriber` registry once at startup; tests install a
//! test-writer subscriber so output is captured per test.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directive applied to third-party crates so HTTP plumbing stays quiet.
const DEPENDENCY_DIRECTIVES: &str = "reqwest=warn,hyper=warn,hyper_util=warn,rustls=warn";

/// Pick the crate log level from the `-v`/`-q` flags.
#[must_use]
pub const fn level_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn build_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = level_for(verbose, quiet);
    EnvFilter::new(format!("linear_jira_sync={level},{DEPENDENCY_DIRECTIVES}"))
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity flags. When `log_file` is
/// given, JSON-formatted events are appended to it in addition to the
/// human-readable stderr output.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global subscriber
/// is already installed.
pub fn init_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> crate::Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(build_filter(verbose, quiet))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(())
}

/// Install a debug-level subscriber that writes through the test harness.
///
/// Safe to call from many tests; only the first call installs anything.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("linear_jira_sync=debug"))
        .with_test_writer()
        .try_init();
}
