//! Configuration module - engine settings
//!
//! This module provides functionality for:
//! - Loading configuration from ~/.shortkeys/config.json
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - Configuration struct definitions (EngineConfig)
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{
    DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER, DEFAULT_STORAGE_DIR, DEFAULT_SYNC_QUOTA_BYTES,
};
pub use loader::{config_path, load_config, load_config_from, ConfigError};
pub use types::EngineConfig;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
