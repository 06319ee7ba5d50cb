use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

fn env_filter() -> EnvFilter {
    // Get log level from environment or default to info
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to the terminal.
pub fn init_logger() {
    fmt()
        .with_env_filter(env_filter())
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(true)
        .init();
}

/// Log to a file so the terminal stays free for the table view.
pub fn init_file_logger(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    fmt()
        .with_env_filter(env_filter())
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}
