//! Configuration loading from file system

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, instrument, warn};

use super::defaults::DEFAULT_CONFIG_PATH;
use super::types::EngineConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// `~/.shortkeys/config.json`, expanded.
pub fn config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref())
}

/// Load configuration from ~/.shortkeys/config.json
///
/// Returns `EngineConfig::default()` if the file is missing or invalid.
#[instrument(name = "load_config")]
pub fn load_config() -> EngineConfig {
    let path = config_path();
    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using defaults");
        return EngineConfig::default();
    }

    match load_config_from(&path) {
        Ok(config) => {
            info!(path = %path.display(), "Successfully loaded config");
            config
        }
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            EngineConfig::default()
        }
    }
}

/// Load and parse a specific config file. An empty file yields defaults.
pub fn load_config_from(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
