use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Rotated log files kept on disk.
const MAX_LOG_FILES: usize = 3;

fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "mrmattias", "skywall")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Install the global subscriber writing to a rotating log file.
///
/// The TUI owns the terminal, so nothing is logged to stdout/stderr.
/// The returned guard must be held for the lifetime of the process or
/// buffered lines are lost.
pub fn init() -> Result<WorkerGuard> {
    let dir = log_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log dir {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("skywall")
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(&dir)
        .context("failed to create log appender")?;

    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
