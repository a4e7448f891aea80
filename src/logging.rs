use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;
use crate::error::{AppError, Result};

const LOG_FILE_NAME: &str = "caterpillar.log";

/// Installs the global subscriber. The returned guard flushes the file writer on drop
/// and must be held until the process exits.
pub fn init_tracing(config: &LogConfig) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| AppError::Config(format!("Invalid LOG_FILTER '{}': {}", config.filter, e)))?;

    let (writer, guard) = match &config.dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE_NAME))
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let layer = fmt::layer()
        .with_target(true)
        .with_ansi(config.dir.is_none())
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::info!(
        dir = ?config.dir,
        filter = %config.filter,
        "logging initialized"
    );

    Ok(guard)
}
