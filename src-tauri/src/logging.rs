//! Logging configuration using tracing

use crate::error::AppError;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV_VAR: &str = "DATA_LENSE_LOG";
const DEFAULT_FILTER: &str = "data_lense_lib=info,warn";

/// Install the global subscriber.
///
/// Logs go to stderr and, when `log_dir` is given, to a daily-rolling
/// `data-lense.log` there. The level is controlled by `DATA_LENSE_LOG`:
///
/// ```bash
/// DATA_LENSE_LOG=debug cargo tauri dev
/// ```
pub fn init(log_dir: Option<&Path>) -> Result<(), AppError> {
    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "data-lense.log");
            Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
        }
        None => None,
    };

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError {
            message: format!("Failed to initialize logging: {}", e),
        })?;

    if let Some(dir) = log_dir {
        tracing::info!("Log directory: {}", dir.display());
    }

    Ok(())
}
