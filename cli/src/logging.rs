use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TODOBOARD_LOG";
const LOG_FILE_NAME: &str = "todoboard.log";

pub enum LogTarget {
    /// One-shot commands: warnings and errors on stderr.
    Stderr,
    /// The TUI owns the terminal, so events go to a file in the data dir.
    File,
}

pub fn init(target: LogTarget) -> Result<()> {
    let installed = match target {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter_or("warn"))
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
        LogTarget::File => {
            let path = log_file_path()?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter_or("info"))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
    };
    installed.map_err(|e| anyhow!("Failed to install logger: {}", e))
}

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}

fn log_file_path() -> Result<PathBuf> {
    let dir = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("Could not determine data directory"))?
        .join("todoboard");
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    Ok(dir.join(LOG_FILE_NAME))
}
