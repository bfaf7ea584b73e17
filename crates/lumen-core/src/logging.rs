//! Logging configuration.
//!
//! Only the description of where and how much to log lives here; the binary
//! turns it into a `tracing-subscriber` registry.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

const LOG_PREFIX: &str = "lumen_";
const LOG_EXTENSION: &str = "log";

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`
    pub level: String,
    /// Log to stderr
    pub console_output: bool,
    /// Log to a daily file in `log_dir`
    pub file_output: bool,
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Log files kept by [`LogConfig::cleanup_old_logs`]
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
            max_files: 7,
        }
    }
}

impl LogConfig {
    /// Parsed level; unknown names fall back to `INFO`
    pub fn parse_level(&self) -> LevelFilter {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "off" => LevelFilter::OFF,
            "error" => LevelFilter::ERROR,
            "warn" | "warning" => LevelFilter::WARN,
            "debug" => LevelFilter::DEBUG,
            "trace" => LevelFilter::TRACE,
            _ => LevelFilter::INFO,
        }
    }

    /// Create the log directory if file output is on
    pub fn ensure_log_directory(&self) -> io::Result<()> {
        if self.file_output {
            fs::create_dir_all(&self.log_dir)?;
        }
        Ok(())
    }

    /// Today's log file
    pub fn current_log_path(&self) -> PathBuf {
        let date = chrono::Local::now().format("%Y-%m-%d");
        self.log_dir
            .join(format!("{}{}.{}", LOG_PREFIX, date, LOG_EXTENSION))
    }

    /// Delete the oldest log files beyond `max_files`. Returns how many were
    /// removed.
    pub fn cleanup_old_logs(&self) -> io::Result<usize> {
        if !self.log_dir.is_dir() {
            return Ok(0);
        }

        let mut logs: Vec<PathBuf> = fs::read_dir(&self.log_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                let is_log = path.extension().is_some_and(|ext| ext == LOG_EXTENSION);
                let ours = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(LOG_PREFIX));
                is_log && ours
            })
            .collect();

        if logs.len() <= self.max_files {
            return Ok(0);
        }

        // Dated names sort chronologically
        logs.sort();
        let excess = logs.len() - self.max_files;
        for path in &logs[..excess] {
            fs::remove_file(path)?;
        }
        Ok(excess)
    }
}
