use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use syncmonitor::config::{get_config_path, load_config, save_config, MonitorConfig};
use syncmonitor::logging::init_logging;
use syncmonitor::sync::replay::{replay, Scenario};

#[derive(Parser, Debug)]
#[command(name = "syncmonitor", version, about = "Watch synchronisation health and replay monitor scenarios")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feed a scenario file through a live monitor and print the status after each step
    Replay {
        scenario: PathBuf,
        /// Print one JSON report per line instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the default config file location
    ConfigPath,
    /// Write a config file with default values
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };
    let config = load_config(&config_path).context("Failed to load configuration")?;

    let level = match &cli.log_level {
        Some(level) => simplelog::LevelFilter::from_str(level)
            .map_err(|_| anyhow::anyhow!("Invalid log level: '{}'", level))?,
        None => config.level_filter()?,
    };
    init_logging(&config, level)?;

    match cli.command {
        Command::Replay { scenario, json } => {
            let scenario = Scenario::load(&scenario)?;
            log::info!("Replaying {} steps", scenario.steps.len());

            for (index, outcome) in replay(&scenario, config.settle_timeout()).await?.iter().enumerate() {
                let report = &outcome.report;
                if json {
                    println!("{}", serde_json::to_string(report).context("Failed to serialize report")?);
                } else {
                    println!(
                        "#{:<3} {:<24} setup={:<11} import={:<11} export={:<11}{}",
                        index + 1,
                        report.label,
                        report.setup,
                        report.import,
                        report.export,
                        if outcome.changed { "" } else { "  (no change)" },
                    );
                    if let Some(err) = report
                        .setup_error
                        .as_ref()
                        .or(report.import_error.as_ref())
                        .or(report.export_error.as_ref())
                    {
                        println!("     error: {}", err);
                    }
                }
            }
        }
        Command::ConfigPath => {
            println!("{}", config_path.display());
        }
        Command::InitConfig => {
            if config_path.exists() {
                anyhow::bail!("Config file already exists: {}", config_path.display());
            }
            save_config(&MonitorConfig::default(), &config_path)?;
            println!("Wrote {}", config_path.display());
        }
    }

    Ok(())
}
