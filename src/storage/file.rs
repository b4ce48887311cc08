use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::watcher::StorageWatcher;
use super::{
    item_bytes, ChangeHub, ChangeOrigin, KeyValueStore, StorageArea, StorageChange, StorageError,
};

pub(super) type AreaItems = HashMap<String, String>;
pub(super) type SeenState = Arc<Mutex<HashMap<StorageArea, AreaItems>>>;

/// Storage with one JSON object file per area (`sync.json`, `local.json`, ...).
///
/// Writes go through a temp file and a rename. The session area is
/// removed when the storage is opened.
pub struct FileStorage {
    dir: PathBuf,
    sync_quota: Option<usize>,
    /// Last contents written or observed per area, shared with the watcher.
    seen: SeenState,
    hub: Arc<ChangeHub>,
}

impl FileStorage {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;

        let session = area_path(&dir, StorageArea::Session);
        if session.exists() {
            fs::remove_file(&session).map_err(|source| StorageError::Io {
                path: session.clone(),
                source,
            })?;
        }

        info!(path = %dir.display(), "Opened file storage");
        Ok(Self {
            dir,
            sync_quota: None,
            seen: Arc::new(Mutex::new(HashMap::new())),
            hub: Arc::new(ChangeHub::new()),
        })
    }

    pub fn with_sync_quota(mut self, quota_bytes: usize) -> Self {
        self.sync_quota = Some(quota_bytes);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn area_path(&self, area: StorageArea) -> PathBuf {
        area_path(&self.dir, area)
    }

    /// Watch the area files for writes made by other processes.
    ///
    /// Changes this instance made itself are not reported twice.
    pub fn watch(&self) -> notify::Result<StorageWatcher> {
        for area in StorageArea::ALL {
            if let Ok(items) = read_area_file(&self.area_path(area)) {
                self.seen.lock().insert(area, items);
            }
        }
        StorageWatcher::start(self.dir.clone(), self.seen.clone(), self.hub.clone())
    }
}

pub(super) fn area_path(dir: &Path, area: StorageArea) -> PathBuf {
    dir.join(format!("{}.json", area.as_str()))
}

/// Read an area file. A missing or empty file is an empty area.
pub(super) fn read_area_file(path: &Path) -> Result<AreaItems, StorageError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AreaItems::new()),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if content.trim().is_empty() {
        return Ok(AreaItems::new());
    }
    serde_json::from_str(&content).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_area_file(path: &Path, items: &AreaItems) -> Result<(), StorageError> {
    let content = serde_json::to_string_pretty(items).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).map_err(|source| StorageError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl KeyValueStore for FileStorage {
    fn get(&self, area: StorageArea, key: &str) -> Result<Option<String>, StorageError> {
        let items = read_area_file(&self.area_path(area))?;
        Ok(items.get(key).cloned())
    }

    fn set(&self, area: StorageArea, key: &str, value: &str) -> Result<(), StorageError> {
        if area == StorageArea::Managed {
            return Err(StorageError::ReadOnly(area));
        }

        let path = self.area_path(area);
        {
            let mut seen = self.seen.lock();
            let mut items = read_area_file(&path)?;

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
            write_area_file(&path, &items)?;
            seen.insert(area, items);
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn values_persist_across_instances() {
        let dir = tempdir().unwrap();
        {
            let storage = FileStorage::open(dir.path()).unwrap();
            storage.set(StorageArea::Sync, "keys", "[1]").unwrap();
            storage.set(StorageArea::Local, "keys", "[2]").unwrap();
        }
        let storage = FileStorage::open(dir.path()).unwrap();
        assert_eq!(
            storage.get(StorageArea::Sync, "keys").unwrap().as_deref(),
            Some("[1]")
        );
        assert_eq!(
            storage.get(StorageArea::Local, "keys").unwrap().as_deref(),
            Some("[2]")
        );
    }

    #[test]
    fn missing_files_read_as_empty() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("nested")).unwrap();
        assert_eq!(storage.get(StorageArea::Sync, "keys").unwrap(), None);
    }

    #[test]
    fn session_area_is_cleared_on_open() {
        let dir = tempdir().unwrap();
        {
            let storage = FileStorage::open(dir.path()).unwrap();
            storage.set(StorageArea::Session, "scratch", "x").unwrap();
        }
        let storage = FileStorage::open(dir.path()).unwrap();
        assert_eq!(storage.get(StorageArea::Session, "scratch").unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        fs::write(storage.area_path(StorageArea::Sync), "{not json").unwrap();
        assert!(matches!(
            storage.get(StorageArea::Sync, "keys"),
            Err(StorageError::Json { .. })
        ));
    }

    #[test]
    fn sync_quota_rejects_oversized_writes() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap().with_sync_quota(10);
        assert!(matches!(
            storage.set(StorageArea::Sync, "keys", "0123456789"),
            Err(StorageError::QuotaExceeded { .. })
        ));
        assert!(!storage.area_path(StorageArea::Sync).exists());
    }

    #[test]
    fn writes_notify_subscribers() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let rx = storage.subscribe();
        storage.set(StorageArea::Sync, "keys", "[]").unwrap();
        let change = rx.try_recv().unwrap();
        assert_eq!(change.area, StorageArea::Sync);
        assert_eq!(change.key, "keys");
        assert_eq!(change.origin, ChangeOrigin::ThisInstance);
    }
}
