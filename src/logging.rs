// src/logging.rs
// Logger setup for the binary.

use anyhow::{Context, Result};
use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;

use crate::config::MonitorConfig;

/// Install the global logger: the terminal always, plus a file when configured.
pub fn init_logging(config: &MonitorConfig, level: LevelFilter) -> Result<()> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = &config.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }

    CombinedLogger::init(loggers).context("Failed to initialize logger")
}
