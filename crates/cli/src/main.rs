//! Fawwerty CLI - command-line access to the GRC platform API

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use fawwerty_core::StateDir;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "fawwerty")]
#[command(about = "Client for the Fawwerty security and compliance platform")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// State directory for configuration, session and logs
    #[arg(short = 'd', long, global = true, env = "FAWWERTY_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Configuration file (defaults to <state dir>/config/config.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding configuration
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Timeout for the whole command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "0")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let state_dir = StateDir::resolve(cli.state_dir.clone());
    logging::init_logging(cli.log_level.into(), &state_dir, cli.no_file_log)?;

    let app_config = config::load_config(cli.config.as_deref(), &state_dir, cli.api_url)?;
    debug!(base_url = %app_config.api.base_url, "Loaded configuration");

    let context = commands::Context {
        config: app_config,
        state_dir,
    };

    let result = if cli.timeout == 0 {
        cli.command.execute(context).await
    } else {
        let timeout_duration = Duration::from_secs(cli.timeout);
        match tokio::time::timeout(timeout_duration, cli.command.execute(context)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "Command timed out after {} seconds",
                cli.timeout
            )),
        }
    };

    if let Err(e) = result {
        error!("Command failed: {e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
