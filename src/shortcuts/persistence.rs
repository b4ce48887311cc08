//! Shortcut list persistence across the sync and local storage areas.
//!
//! # Backend preference
//!
//! Writes go to `sync` unless the serialized list exceeds the sync quota or
//! the sync write fails; then `local` is the primary copy. Either way the
//! same string is written to `local`, so the device copy is never behind.
//!
//! Reads always try `sync` first and fall back to `local`. When a save lands
//! in `local`, any list still held in `sync` is cleared so the older copy
//! does not shadow it; a later write to `sync` from another device wins.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::codec::serialize_shortcuts;
use super::types::Shortcut;
use crate::storage::{item_bytes, KeyValueStore, StorageArea, StorageChange, StorageError};

/// Key holding the serialized shortcut list in both areas.
pub const SHORTCUTS_KEY: &str = "keys";
/// Local key set once the local-to-sync migration has run.
pub const MIGRATION_FLAG_KEY: &str = "syncMigrated";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to serialize shortcuts: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("local storage write failed, shortcuts were not saved: {0}")]
    LocalWriteFailed(#[source] StorageError),

    #[error("failed to record sync migration: {0}")]
    MigrationFlag(#[source] StorageError),
}

/// Why a save landed in local storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    Oversized { bytes: usize, quota: usize },
    SyncWriteFailed,
}

/// Which area holds the primary copy after a save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveOutcome {
    pub area: StorageArea,
    pub fallback: Option<FallbackReason>,
}

/// What reading the stored list from both areas produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoredList {
    Found {
        area: StorageArea,
        serialized: String,
    },
    /// Both areas were read and neither holds a list.
    Absent,
    /// No list was found and at least one area could not be read.
    Unavailable,
}

impl StoredList {
    pub fn into_serialized(self) -> Option<String> {
        match self {
            StoredList::Found { serialized, .. } => Some(serialized),
            StoredList::Absent | StoredList::Unavailable => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MigrationOutcome {
    AlreadyDone,
    Copied,
    SyncAlreadyPopulated,
    NothingToMigrate,
    CopyFailed,
}

/// Raw save/load of the serialized list over a [`KeyValueStore`].
#[derive(Clone)]
pub struct ShortcutPersistence {
    storage: Arc<dyn KeyValueStore>,
    sync_quota_bytes: usize,
}

impl ShortcutPersistence {
    pub fn new(storage: Arc<dyn KeyValueStore>, sync_quota_bytes: usize) -> Self {
        Self {
            storage,
            sync_quota_bytes,
        }
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    pub fn sync_quota_bytes(&self) -> usize {
        self.sync_quota_bytes
    }

    pub fn save(&self, shortcuts: &[Shortcut]) -> Result<SaveOutcome, StoreError> {
        let serialized = serialize_shortcuts(shortcuts)?;
        self.save_raw(&serialized)
    }

    /// Write an already serialized list.
    ///
    /// Fails only when the local write fails; a sync failure falls back.
    #[instrument(name = "save_shortcuts", skip_all, fields(bytes = serialized.len()))]
    pub fn save_raw(&self, serialized: &str) -> Result<SaveOutcome, StoreError> {
        let bytes = item_bytes(SHORTCUTS_KEY, serialized);
        let quota = self.sync_quota_bytes;

        let fallback = if bytes > quota {
            Some(FallbackReason::Oversized { bytes, quota })
        } else {
            match self.storage.set(StorageArea::Sync, SHORTCUTS_KEY, serialized) {
                Ok(()) => None,
                Err(e) => {
                    warn!(error = %e, "Sync write failed, falling back to local storage");
                    Some(FallbackReason::SyncWriteFailed)
                }
            }
        };

        let outcome = match fallback {
            None => {
                if let Err(e) = self.storage.set(StorageArea::Local, SHORTCUTS_KEY, serialized) {
                    warn!(error = %e, "Local backup write failed");
                }
                SaveOutcome {
                    area: StorageArea::Sync,
                    fallback: None,
                }
            }
            Some(reason) => {
                self.storage
                    .set(StorageArea::Local, SHORTCUTS_KEY, serialized)
                    .map_err(StoreError::LocalWriteFailed)?;
                self.clear_stale_sync_copy();
                SaveOutcome {
                    area: StorageArea::Local,
                    fallback: Some(reason),
                }
            }
        };

        info!(
            event_type = "shortcuts_saved",
            area = %outcome.area,
            bytes = bytes,
            fallback = ?outcome.fallback,
            "Saved shortcuts"
        );
        Ok(outcome)
    }

    /// Empty the sync copy after a save that could only land in local.
    ///
    /// Leaves an empty sync area untouched. A failure here means the older
    /// sync list is served by [`Self::load`] until the next sync save.
    fn clear_stale_sync_copy(&self) {
        match self.storage.get(StorageArea::Sync, SHORTCUTS_KEY) {
            Ok(Some(value)) if !value.trim().is_empty() => {
                match self.storage.set(StorageArea::Sync, SHORTCUTS_KEY, "") {
                    Ok(()) => info!("Cleared stale sync copy after local fallback"),
                    Err(e) => warn!(error = %e, "Could not clear stale sync copy"),
                }
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not check sync copy after local fallback"),
        }
    }

    /// Read the serialized list, `sync` first.
    ///
    /// Empty values and failed reads fall through to `local`. Failed reads
    /// with nothing found are reported as [`StoredList::Unavailable`], not
    /// as an absent list.
    pub fn load_from(&self) -> StoredList {
        let mut read_failed = false;
        for area in [StorageArea::Sync, StorageArea::Local] {
            match self.storage.get(area, SHORTCUTS_KEY) {
                Ok(Some(value)) if !value.trim().is_empty() => {
                    debug!(area = %area, bytes = value.len(), "Loaded shortcuts");
                    return StoredList::Found {
                        area,
                        serialized: value,
                    };
                }
                Ok(_) => debug!(area = %area, "No shortcuts stored"),
                Err(e) => {
                    warn!(error = %e, area = %area, "Reading shortcuts failed");
                    read_failed = true;
                }
            }
        }
        if read_failed {
            StoredList::Unavailable
        } else {
            StoredList::Absent
        }
    }

    /// Read the serialized list, or `None` when neither area has one.
    pub fn load(&self) -> Option<String> {
        self.load_from().into_serialized()
    }

    /// Copy a pre-sync local list into the empty sync area, once.
    ///
    /// The completion flag is written whether or not a copy happened, so
    /// calling this on every startup is cheap and idempotent.
    pub fn migrate_local_to_sync(&self) -> Result<MigrationOutcome, StoreError> {
        match self.storage.get(StorageArea::Local, MIGRATION_FLAG_KEY) {
            Ok(Some(flag)) if flag == "true" => return Ok(MigrationOutcome::AlreadyDone),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not read migration flag"),
        }

        let outcome = self.copy_local_to_sync();
        self.storage
            .set(StorageArea::Local, MIGRATION_FLAG_KEY, "true")
            .map_err(StoreError::MigrationFlag)?;

        info!(event_type = "sync_migration", outcome = ?outcome, "Local to sync migration finished");
        Ok(outcome)
    }

    fn copy_local_to_sync(&self) -> MigrationOutcome {
        let local = match self.storage.get(StorageArea::Local, SHORTCUTS_KEY) {
            Ok(Some(value)) if !value.trim().is_empty() => value,
            Ok(_) => return MigrationOutcome::NothingToMigrate,
            Err(e) => {
                warn!(error = %e, "Could not read local shortcuts for migration");
                return MigrationOutcome::NothingToMigrate;
            }
        };

        match self.storage.get(StorageArea::Sync, SHORTCUTS_KEY) {
            Ok(Some(value)) if !value.trim().is_empty() => {
                return MigrationOutcome::SyncAlreadyPopulated
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Could not read sync shortcuts for migration");
                return MigrationOutcome::CopyFailed;
            }
        }

        let bytes = item_bytes(SHORTCUTS_KEY, &local);
        if bytes > self.sync_quota_bytes {
            warn!(bytes = bytes, quota = self.sync_quota_bytes, "Local shortcuts too large to sync");
            return MigrationOutcome::CopyFailed;
        }

        match self.storage.set(StorageArea::Sync, SHORTCUTS_KEY, &local) {
            Ok(()) => MigrationOutcome::Copied,
            Err(e) => {
                warn!(error = %e, "Copying shortcuts to sync failed");
                MigrationOutcome::CopyFailed
            }
        }
    }

    pub fn subscribe(&self) -> ShortcutChanges {
        ShortcutChanges {
            rx: self.storage.subscribe(),
        }
    }
}

/// External changes to the stored shortcut list in either shortcut area.
///
/// This instance's own saves, events from other areas (managed, session)
/// and other keys are skipped.
pub struct ShortcutChanges {
    rx: async_channel::Receiver<StorageChange>,
}

impl ShortcutChanges {
    pub fn is_relevant(change: &StorageChange) -> bool {
        change.is_external() && change.area.holds_shortcuts() && change.key == SHORTCUTS_KEY
    }

    pub async fn recv(&self) -> Option<StorageChange> {
        while let Ok(change) = self.rx.recv().await {
            if Self::is_relevant(&change) {
                return Some(change);
            }
        }
        None
    }

    pub fn recv_blocking(&self) -> Option<StorageChange> {
        while let Ok(change) = self.rx.recv_blocking() {
            if Self::is_relevant(&change) {
                return Some(change);
            }
        }
        None
    }

    /// Next pending relevant change without waiting.
    pub fn try_recv(&self) -> Option<StorageChange> {
        while let Ok(change) = self.rx.try_recv() {
            if Self::is_relevant(&change) {
                return Some(change);
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "persistence_tests.rs"]
mod tests;
