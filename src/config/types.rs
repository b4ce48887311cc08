//! Configuration type definitions

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::shortcuts::{BindingPolicy, ConflictMode};

/// Engine settings read from `config.json`.
///
/// Every field is optional in the file; missing fields take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Directory for area files (default: ~/.shortkeys/storage)
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
    /// Sync area per-item quota in bytes (default: 102400)
    #[serde(default = "default_sync_quota_bytes")]
    pub sync_quota_bytes: usize,
    /// How `import` treats existing keys (default: replace)
    #[serde(default = "default_import_conflict_mode")]
    pub import_conflict_mode: ConflictMode,
    /// How pack installs treat existing keys (default: skip)
    #[serde(default = "default_pack_conflict_mode")]
    pub pack_conflict_mode: ConflictMode,
    #[serde(default)]
    pub binding_policy: BindingPolicy,
    /// Overridden by RUST_LOG when set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_storage_dir() -> String {
    DEFAULT_STORAGE_DIR.to_string()
}
fn default_sync_quota_bytes() -> usize {
    DEFAULT_SYNC_QUOTA_BYTES
}
fn default_import_conflict_mode() -> ConflictMode {
    ConflictMode::Replace
}
fn default_pack_conflict_mode() -> ConflictMode {
    ConflictMode::Skip
}
fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            storage_dir: default_storage_dir(),
            sync_quota_bytes: DEFAULT_SYNC_QUOTA_BYTES,
            import_conflict_mode: default_import_conflict_mode(),
            pack_conflict_mode: default_pack_conflict_mode(),
            binding_policy: BindingPolicy::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl EngineConfig {
    /// Storage directory with `~` and `$VARS` expanded.
    pub fn storage_path(&self) -> PathBuf {
        match shellexpand::full(&self.storage_dir) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => PathBuf::from(shellexpand::tilde(&self.storage_dir).as_ref()),
        }
    }
}
