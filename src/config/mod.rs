// src/config/mod.rs

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use simplelog::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// One of off, error, warn, info, debug, trace.
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    /// How long `replay` waits for the monitor to settle after each step.
    pub settle_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            log_level: "info".to_string(),
            log_file: None,
            settle_timeout_ms: 250,
        }
    }
}

impl MonitorConfig {
    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| anyhow::anyhow!("Invalid log level: '{}'", self.log_level))
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "SyncMonitor", "SyncMonitor")
        .context("Failed to get project directories")?;
    let config_dir = proj_dirs.config_dir();
    fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
    Ok(config_dir.join("syncmonitor.toml"))
}

pub fn load_config(config_path: &Path) -> Result<MonitorConfig> {
    if !config_path.exists() {
        // Return default config if file doesn't exist
        return Ok(MonitorConfig::default());
    }
    let contents = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let config: MonitorConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
    config
        .level_filter()
        .with_context(|| format!("Invalid config file: {}", config_path.display()))?;
    Ok(config)
}

pub fn save_config(config: &MonitorConfig, config_path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(config_path, contents)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
    Ok(())
}
