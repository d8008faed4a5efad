//! Logging infrastructure for strata
//!
//! The library emits `tracing` events; this module installs the subscriber.
//! Console output is always on. When a log directory is configured, a daily
//! rotating file (`strata.<date>.log`) is written as well.
//!
//! ## Usage
//!
//! ```no_run
//! // Initialize once at startup
//! strata::logging::init(None).expect("Failed to initialize logging");
//!
//! tracing::info!("Pipeline started");
//! ```

use anyhow::{Context as _, Result};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Builds the env filter - default to INFO, allow override with `RUST_LOG`
fn env_filter() -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")
}

/// Initializes console logging and, if `log_dir` is given, a rotating file log.
///
/// Console output goes to stderr so partition data or JSON reports on stdout
/// stay machine-readable.
///
/// # Errors
///
/// Returns error if the log directory cannot be created, the file appender
/// fails, or a global subscriber is already installed.
pub fn init(log_dir: Option<&Path>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_filter(env_filter()?);

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(10)
                .filename_prefix("strata")
                .filename_suffix("log")
                .build(dir)
                .context("Failed to create log file appender")?;

            Some(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false)
                    .with_writer(appender)
                    .with_filter(env_filter()?),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(dir) = log_dir {
        tracing::info!("Logging initialized, log directory: {}", dir.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_defaults() {
        assert!(env_filter().is_ok());
    }
}
