//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Config file location, tilde-expanded at load time
pub const DEFAULT_CONFIG_PATH: &str = "~/.shortkeys/config.json";

/// Directory holding one JSON file per storage area
pub const DEFAULT_STORAGE_DIR: &str = "~/.shortkeys/storage";

/// Per-item byte limit of the sync area
pub const DEFAULT_SYNC_QUOTA_BYTES: usize = 102_400;

/// Default `tracing` filter when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
