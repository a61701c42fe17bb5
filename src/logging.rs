use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logs to stdout and appends plain-text lines to `log_file`. Keep the returned guard alive
/// until exit so buffered lines reach the file.
pub fn init_logging(log_file: &Path, verbose: bool) -> Result<WorkerGuard> {
    let level = if verbose { "debug" } else { "info" };
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = log_file
        .file_name()
        .with_context(|| format!("Log file {} has no file name", log_file.display()))?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false);
    let stdout_layer = fmt::layer().with_writer(io::stdout).with_target(false);

    let file_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(file_layer.with_filter(file_filter))
        .with(stdout_layer.with_filter(console_filter))
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(guard)
}
