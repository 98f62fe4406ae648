//! CLI configuration utilities

use anyhow::{Context, Result};
use fawwerty_core::{AppConfig, StateDir};
use std::path::{Path, PathBuf};

/// Load configuration, preferring an explicit file over the state dir default
pub fn load_config(
    path: Option<&Path>,
    state_dir: &StateDir,
    api_url: Option<String>,
) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load(Some(path))
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load_optional(&state_dir.config_path())?,
    };

    if let Some(url) = api_url {
        config.api.base_url = url;
    }

    Ok(config)
}

/// Directory holding the durable session file
pub fn session_dir(config: &AppConfig, state_dir: &StateDir) -> PathBuf {
    config
        .storage
        .dir
        .clone()
        .unwrap_or_else(|| state_dir.data_dir())
}
