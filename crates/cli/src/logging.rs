use anyhow::Result;
use fawwerty_core::StateDir;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for the CLI
///
/// Logs always go to stderr so stdout stays machine-readable. Unless
/// disabled, they are also appended to `<logs dir>/cli.log`.
pub fn init_logging(log_level: Level, state_dir: &StateDir, no_file_log: bool) -> Result<()> {
    let env_filter = env_filter(log_level);

    if no_file_log {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(());
    }

    state_dir.create_directories()?;
    let log_file_path = get_log_file_path(state_dir);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

/// RUST_LOG wins over the command-line level
fn env_filter(level: Level) -> EnvFilter {
    let level_str = level.as_str().to_lowercase();
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "fawwerty={level_str},fawwerty_core={level_str},fawwerty_http={level_str},fawwerty_session={level_str}"
        )
        .into()
    })
}

fn get_log_file_path(state_dir: &StateDir) -> PathBuf {
    state_dir.logs_dir().join("cli.log")
}
