// 📝 Logging - One subscriber per pipeline run
// JSON lines to the configured log file, readable lines to stderr

use crate::config::LoggingConfig;
use crate::error::{EtlError, Result};
use std::fs;
use std::path::Path;
use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Translate a configured level name into a filter directive
///
/// Accepts tracing names in any case plus the usual aliases
/// (`WARNING`, `CRITICAL`, `FATAL`). Anything else is passed through as a
/// full directive string, e.g. `healthcare_etl=debug`.
pub fn level_directive(level: &str) -> String {
    let level = level.trim().to_lowercase();
    match level.as_str() {
        "" => "info".to_string(),
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        _ => level,
    }
}

pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level_directive(level)).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Build the run's log dispatcher
///
/// The returned guard flushes the file writer when dropped; keep it alive for the whole run.
pub fn build_dispatch(config: &LoggingConfig) -> Result<(Dispatch, WorkerGuard)> {
    let file_name = config
        .log_file
        .file_name()
        .ok_or_else(|| {
            EtlError::Logging(format!(
                "log_file has no file name: {}",
                config.log_file.display()
            ))
        })?
        .to_string_lossy()
        .to_string();

    let directory = config
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
        .map_err(|e| EtlError::Logging(e.to_string()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_writer(std::io::stderr));

    Ok((Dispatch::new(subscriber), guard))
}
