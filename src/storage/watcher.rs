use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{recommended_watcher, RecommendedWatcher, RecursiveMode, Result as NotifyResult, Watcher};
use tracing::{debug, info, warn};

use super::file::{area_path, read_area_file, AreaItems, SeenState};
use super::{ChangeHub, ChangeOrigin, StorageArea, StorageChange};

/// Watches a storage directory and reports values changed by other writers.
///
/// Each modified area file is diffed against the last contents seen, and a
/// [`StorageChange`] is emitted per changed or removed key. Dropping the
/// watcher stops it.
pub struct StorageWatcher {
    dir: PathBuf,
    _watcher: RecommendedWatcher,
}

impl StorageWatcher {
    pub(super) fn start(dir: PathBuf, seen: SeenState, hub: Arc<ChangeHub>) -> NotifyResult<Self> {
        let callback_dir = dir.clone();
        let mut watcher = recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                let relevant = matches!(
                    event.kind,
                    notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
                );
                if !relevant {
                    return;
                }
                for area in changed_areas(&event.paths) {
                    sync_area(&callback_dir, area, &seen, &hub);
                }
            }
            Err(e) => warn!(error = %e, watcher = "storage", "File watcher error"),
        })?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!(path = %dir.display(), "Storage watcher started");

        Ok(Self {
            dir,
            _watcher: watcher,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Drop for StorageWatcher {
    fn drop(&mut self) {
        info!(path = %self.dir.display(), "Storage watcher shutting down");
    }
}

/// Areas whose files appear in `paths`. Temp files are ignored.
fn changed_areas(paths: &[PathBuf]) -> Vec<StorageArea> {
    let mut areas = Vec::new();
    for path in paths {
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let area = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(StorageArea::from_name);
        if let (true, Some(area)) = (is_json, area) {
            if !areas.contains(&area) {
                areas.push(area);
            }
        }
    }
    areas
}

/// Keys whose value differs between two snapshots of an area.
fn diff_keys(before: &AreaItems, after: &AreaItems) -> Vec<String> {
    let mut keys: Vec<String> = after
        .iter()
        .filter(|(k, v)| before.get(*k) != Some(*v))
        .map(|(k, _)| k.clone())
        .collect();
    keys.extend(before.keys().filter(|k| !after.contains_key(*k)).cloned());
    keys.sort();
    keys
}

fn sync_area(dir: &Path, area: StorageArea, seen: &SeenState, hub: &ChangeHub) {
    let items = match read_area_file(&area_path(dir, area)) {
        Ok(items) => items,
        Err(e) => {
            // Usually a write caught half-way; the next event re-reads it.
            debug!(error = %e, area = %area, "Skipping unreadable area file");
            return;
        }
    };

    let changed = {
        let mut seen = seen.lock();
        let before = seen.remove(&area).unwrap_or_default();
        let changed = diff_keys(&before, &items);
        seen.insert(area, items);
        changed
    };

    for key in changed {
        info!(area = %area, key = %key, "External storage change");
        hub.emit(StorageChange {
            area,
            key,
            origin: ChangeOrigin::External,
        });
    }
}
