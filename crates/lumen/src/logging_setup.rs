use anyhow::{Context, Result};
use lumen_core::LogConfig;
use std::fs::File;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Keeps the file writer thread alive; drop it last
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Install the global subscriber described by `config`.
///
/// Console logs go to stderr since stdout carries the JSON output stream.
pub fn init(config: &LogConfig) -> Result<Option<LogGuard>> {
    config
        .ensure_log_directory()
        .context("Failed to create log directory")?;

    if config.file_output {
        match config.cleanup_old_logs() {
            Ok(0) => {}
            Ok(removed) => eprintln!("Removed {} old log files", removed),
            Err(e) => eprintln!("Warning: Failed to cleanup old log files: {}", e),
        }
    }

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::builder()
        .with_default_directive(config.parse_level().into())
        .from_env_lossy();

    let console_layer = config.console_output.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter.clone())
    });

    let (file_layer, guard) = if config.file_output {
        let log_path = config.current_log_path();
        let file = File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {:?}", log_path))?;
        let (writer, worker_guard) = tracing_appender::non_blocking(file);
        eprintln!("Logging to file: {:?}", log_path);

        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(filter);
        (Some(layer), Some(LogGuard { _guard: worker_guard }))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Global tracing subscriber already installed")?;

    tracing::debug!("Logging initialized at level: {}", config.level);
    Ok(guard)
}
