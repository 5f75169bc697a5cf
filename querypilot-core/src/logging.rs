//! Shared logging utilities for the querypilot binary.
//!
//! Provides consistent logging configuration driven by CLI verbosity.
//! Credential material never reaches a log line; database URLs must be
//! passed through [`crate::error::redact_database_url`] before logging.

use crate::error::{QueryPilotError, Result};

/// Initializes structured logging based on verbosity level.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
/// * `quiet` - If true, only show ERROR level logs
///
/// # Example
/// ```rust,no_run
/// use querypilot_core::logging::init_logging;
///
/// // Initialize at DEBUG level
/// init_logging(1, false).expect("Failed to initialize logging");
/// ```
///
/// # Errors
/// Returns [`QueryPilotError::Configuration`] if a global subscriber is
/// already installed.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| {
            QueryPilotError::configuration(format!("failed to initialize logging: {e}"))
        })?;

    Ok(())
}
