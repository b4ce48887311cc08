use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use tracing::debug;

use super::{
    item_bytes, ChangeHub, ChangeOrigin, KeyValueStore, StorageArea, StorageChange, StorageError,
};

/// In-process storage with an optional sync quota.
///
/// Areas can be marked unavailable to model a host where sync storage is
/// disabled or temporarily failing.
#[derive(Default)]
pub struct MemoryStorage {
    areas: Mutex<HashMap<StorageArea, HashMap<String, String>>>,
    unavailable: Mutex<HashSet<StorageArea>>,
    sync_quota: Option<usize>,
    hub: ChangeHub,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sync_quota(quota_bytes: usize) -> Self {
        Self {
            sync_quota: Some(quota_bytes),
            ..Self::default()
        }
    }

    pub fn set_available(&self, area: StorageArea, available: bool) {
        let mut unavailable = self.unavailable.lock();
        if available {
            unavailable.remove(&area);
        } else {
            unavailable.insert(area);
        }
    }

    /// Seed a managed-area value; users cannot write that area.
    pub fn set_managed(&self, key: &str, value: &str) {
        self.apply_remote(StorageArea::Managed, key, value);
    }

    /// Apply a value written elsewhere, such as another synced device.
    ///
    /// Bypasses availability, quota and read-only checks, and notifies
    /// subscribers with [`ChangeOrigin::External`].
    pub fn apply_remote(&self, area: StorageArea, key: &str, value: &str) {
        self.areas
            .lock()
            .entry(area)
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.hub.emit(StorageChange {
            area,
            key: key.to_string(),
            origin: ChangeOrigin::External,
        });
    }

    fn check_available(&self, area: StorageArea) -> Result<(), StorageError> {
        if self.unavailable.lock().contains(&area) {
            return Err(StorageError::Unavailable(area));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, area: StorageArea, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available(area)?;
        Ok(self
            .areas
            .lock()
            .get(&area)
            .and_then(|items| items.get(key).cloned()))
    }

    fn set(&self, area: StorageArea, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available(area)?;
        if area == StorageArea::Managed {
            return Err(StorageError::ReadOnly(area));
        }

        {
            let mut areas = self.areas.lock();
            let items = areas.entry(area).or_default();

            if let (StorageArea::Sync, Some(quota)) = (area, self.sync_quota) {
                let others: usize = items
                    .iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| item_bytes(k, v))
                    .sum();
                let bytes = others + item_bytes(key, value);
                if bytes > quota {
                    return Err(StorageError::QuotaExceeded { area, bytes, quota });
                }
            }

            items.insert(key.to_string(), value.to_string());
        }

        debug!(area = %area, key = key, bytes = value.len(), "Stored value");
        self.hub.emit(StorageChange {
            area,
            key: key.to_string(),
            origin: ChangeOrigin::ThisInstance,
        });
        Ok(())
    }

    fn subscribe(&self) -> async_channel::Receiver<StorageChange> {
        self.hub.subscribe()
    }
}
