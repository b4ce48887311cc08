//! Key-value storage areas backing the shortcut store.
//!
//! # Module Structure
//!
//! - `hub` - fan-out of change events to subscribers
//! - `memory` - in-process backend (tests, hosts without disk access)
//! - `file` - one JSON object file per area
//! - `watcher` - emits changes made to area files by other processes

mod file;
mod hub;
mod memory;
mod watcher;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileStorage;
pub use hub::{ChangeHub, CHANGE_BUFFER};
pub use memory::MemoryStorage;
pub use watcher::StorageWatcher;

/// A named storage area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    /// Size-limited, shared across the user's devices.
    Sync,
    /// Per-device, effectively unlimited.
    Local,
    /// Administrator-provided configuration, read-only for the user.
    Managed,
    /// Cleared when the host restarts.
    Session,
}

impl StorageArea {
    pub const ALL: [StorageArea; 4] = [
        StorageArea::Sync,
        StorageArea::Local,
        StorageArea::Managed,
        StorageArea::Session,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageArea::Sync => "sync",
            StorageArea::Local => "local",
            StorageArea::Managed => "managed",
            StorageArea::Session => "session",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|area| area.as_str() == name)
    }

    /// Areas that hold the shortcut list.
    pub fn holds_shortcuts(&self) -> bool {
        matches!(self, StorageArea::Sync | StorageArea::Local)
    }
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who wrote a changed value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A write made through this backend instance.
    ThisInstance,
    /// Another process, device or administrator.
    External,
}

/// A value changed in one area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageChange {
    pub area: StorageArea,
    pub key: String,
    pub origin: ChangeOrigin,
}

impl StorageChange {
    pub fn is_external(&self) -> bool {
        self.origin == ChangeOrigin::External
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{area} storage quota exceeded: {bytes} bytes needed, limit is {quota}")]
    QuotaExceeded {
        area: StorageArea,
        bytes: usize,
        quota: usize,
    },

    #[error("{0} storage is unavailable")]
    Unavailable(StorageArea),

    #[error("{0} storage is read-only")]
    ReadOnly(StorageArea),

    #[error("storage I/O failed for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file '{}' is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A backend exposing the named areas.
///
/// Writes to one key replace its whole value. Implementations emit a
/// [`StorageChange`] to subscribers after every successful write, tagged
/// [`ChangeOrigin::ThisInstance`], and tag writes they observe from
/// elsewhere [`ChangeOrigin::External`].
pub trait KeyValueStore: Send + Sync {
    fn get(&self, area: StorageArea, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, area: StorageArea, key: &str, value: &str) -> Result<(), StorageError>;

    fn subscribe(&self) -> async_channel::Receiver<StorageChange>;
}

/// Bytes an item occupies against a quota: key plus JSON-encoded value.
pub fn item_bytes(key: &str, value: &str) -> usize {
    let encoded = serde_json::to_string(value).map_or(value.len() + 2, |s| s.len());
    key.len() + encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_names_round_trip() {
        for area in StorageArea::ALL {
            assert_eq!(StorageArea::from_name(area.as_str()), Some(area));
        }
        assert_eq!(StorageArea::from_name("bogus"), None);
    }

    #[test]
    fn only_sync_and_local_hold_shortcuts() {
        assert!(StorageArea::Sync.holds_shortcuts());
        assert!(StorageArea::Local.holds_shortcuts());
        assert!(!StorageArea::Managed.holds_shortcuts());
        assert!(!StorageArea::Session.holds_shortcuts());
    }

    #[test]
    fn item_bytes_counts_json_escapes() {
        assert_eq!(item_bytes("k", "ab"), 1 + 4);
        assert_eq!(item_bytes("k", "a\"b"), 1 + 6);
    }
}
