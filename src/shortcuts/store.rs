//! The in-memory shortcut list and its load/save lifecycle.
//!
//! ```text
//! Uninitialized --load--> Loaded --edit--> Dirty --persist--> Persisted
//!                                            ^                    |
//!                                            +-------edit---------+
//! ```
//!
//! The store keeps two lists: the working list that edits apply to, and
//! the last list that completed a persistence round-trip. Resolution for
//! correctness reads the latter; callers may resolve against the working
//! list for responsiveness. A failed save leaves the last good list intact.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use super::codec::parse_shortcuts;
use super::merge::{merge, ConflictMode, MergeReport};
use super::packs::{install_pack, ShortcutPack};
use super::persistence::{
    SaveOutcome, ShortcutChanges, ShortcutPersistence, StoreError, StoredList,
};
use super::resolve::{resolve, Resolved};
use super::types::{new_shortcut_id, Shortcut};
use crate::error::ResultExt;
use crate::storage::StorageArea;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Loaded,
    Dirty,
    Persisted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { area: StorageArea, count: usize },
    /// Nothing stored in either area: first run or upgrade.
    Absent,
    /// Storage could not be read; the previous list is kept.
    Unavailable,
    /// Stored data did not parse; the previous list is kept.
    Corrupt { area: StorageArea },
    /// Unsaved edits exist, so nothing was reloaded.
    Deferred,
}

/// Shared handle for hosts that touch the store from several places.
pub type SharedStore = Arc<parking_lot::Mutex<ShortcutStore>>;

pub struct ShortcutStore {
    persistence: ShortcutPersistence,
    working: Vec<Shortcut>,
    persisted: Arc<Vec<Shortcut>>,
    state: StoreState,
}

impl ShortcutStore {
    pub fn new(persistence: ShortcutPersistence) -> Self {
        Self {
            persistence,
            working: Vec::new(),
            persisted: Arc::new(Vec::new()),
            state: StoreState::Uninitialized,
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(parking_lot::Mutex::new(self))
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == StoreState::Dirty
    }

    pub fn persistence(&self) -> &ShortcutPersistence {
        &self.persistence
    }

    /// Run the one-time migration, then load.
    pub fn initialize(&mut self) -> LoadOutcome {
        self.persistence.migrate_local_to_sync().warn_on_err();
        self.reload()
    }

    /// Replace both lists with what storage holds.
    ///
    /// Refuses while there are unsaved edits; see [`Self::discard_edits`].
    pub fn reload(&mut self) -> LoadOutcome {
        if self.is_dirty() {
            info!("Skipping reload, store has unsaved edits");
            return LoadOutcome::Deferred;
        }

        let (area, serialized) = match self.persistence.load_from() {
            StoredList::Found { area, serialized } => (area, serialized),
            StoredList::Absent => {
                self.working.clear();
                self.persisted = Arc::new(Vec::new());
                self.state = StoreState::Loaded;
                return LoadOutcome::Absent;
            }
            StoredList::Unavailable => {
                warn!("Shortcut storage unreadable, keeping last known list");
                if self.state == StoreState::Uninitialized {
                    self.state = StoreState::Loaded;
                }
                return LoadOutcome::Unavailable;
            }
        };

        match parse_shortcuts(&serialized) {
            Ok(mut shortcuts) => {
                for shortcut in shortcuts.iter_mut() {
                    shortcut.canonicalize();
                }
                let assigned = ensure_unique_ids(&mut shortcuts);
                if assigned > 0 {
                    info!(assigned = assigned, "Assigned ids to stored shortcuts");
                }
                let count = shortcuts.len();
                self.persisted = Arc::new(shortcuts.clone());
                self.working = shortcuts;
                self.state = StoreState::Loaded;
                LoadOutcome::Loaded { area, count }
            }
            Err(e) => {
                warn!(error = %e, area = %area, "Stored shortcuts are corrupt, keeping last known list");
                if self.state == StoreState::Uninitialized {
                    self.state = StoreState::Loaded;
                }
                LoadOutcome::Corrupt { area }
            }
        }
    }

    /// Drop unsaved edits and return to the last persisted list.
    pub fn discard_edits(&mut self) {
        self.working = self.persisted.as_ref().clone();
        if self.state == StoreState::Dirty {
            self.state = StoreState::Persisted;
        }
    }

    /// Working list, including unsaved edits.
    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.working
    }

    /// Last list that completed a load or save.
    pub fn snapshot(&self) -> Arc<Vec<Shortcut>> {
        Arc::clone(&self.persisted)
    }

    pub fn get(&self, id: &str) -> Option<&Shortcut> {
        self.working.iter().find(|s| s.id() == Some(id))
    }

    /// Resolve against the last persisted list.
    pub fn resolve(&self, url: &str) -> Resolved<'_> {
        resolve(&self.persisted, url)
    }

    /// Resolve against the working list, unsaved edits included.
    pub fn resolve_optimistic(&self, url: &str) -> Resolved<'_> {
        resolve(&self.working, url)
    }

    /// Append a shortcut and return its id.
    pub fn add(&mut self, mut shortcut: Shortcut) -> String {
        shortcut.canonicalize();
        let taken = shortcut
            .id()
            .map_or(true, |id| id.is_empty() || self.get(id).is_some());
        if taken {
            shortcut.id = Some(new_shortcut_id());
        }
        let id = shortcut.id.clone().unwrap_or_default();
        self.working.push(shortcut);
        self.mark_dirty();
        id
    }

    /// Edit a shortcut in place. The id cannot be changed.
    pub fn update(&mut self, id: &str, edit: impl FnOnce(&mut Shortcut)) -> bool {
        let Some(shortcut) = self.working.iter_mut().find(|s| s.id() == Some(id)) else {
            return false;
        };
        edit(shortcut);
        shortcut.id = Some(id.to_string());
        shortcut.canonicalize();
        self.mark_dirty();
        true
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        self.update(id, |s| s.enabled = enabled)
    }

    pub fn remove(&mut self, id: &str) -> Option<Shortcut> {
        let index = self.working.iter().position(|s| s.id() == Some(id))?;
        let removed = self.working.remove(index);
        self.mark_dirty();
        Some(removed)
    }

    pub fn replace_all(&mut self, mut shortcuts: Vec<Shortcut>) {
        for shortcut in shortcuts.iter_mut() {
            shortcut.canonicalize();
        }
        ensure_unique_ids(&mut shortcuts);
        self.working = shortcuts;
        self.mark_dirty();
    }

    pub fn import(&mut self, incoming: Vec<Shortcut>, mode: ConflictMode) -> MergeReport {
        let report = merge(&self.working, incoming, mode);
        self.apply(&report);
        report
    }

    pub fn install_pack(&mut self, pack: &ShortcutPack, mode: ConflictMode) -> MergeReport {
        let report = install_pack(&self.working, pack, mode);
        self.apply(&report);
        report
    }

    fn apply(&mut self, report: &MergeReport) {
        if report.changed() {
            self.working = report.merged.clone();
            self.mark_dirty();
        }
    }

    fn mark_dirty(&mut self) {
        self.state = StoreState::Dirty;
    }

    /// Write the working list as one snapshot.
    ///
    /// On failure the store stays dirty and the last good list is kept.
    pub fn persist(&mut self) -> Result<SaveOutcome, StoreError> {
        let outcome = self.persistence.save(&self.working)?;
        self.persisted = Arc::new(self.working.clone());
        self.state = StoreState::Persisted;
        Ok(outcome)
    }

    pub fn subscribe(&self) -> ShortcutChanges {
        self.persistence.subscribe()
    }
}

/// Give every shortcut without a usable id a fresh one. Returns the count.
pub fn ensure_unique_ids(shortcuts: &mut [Shortcut]) -> usize {
    let mut seen: HashSet<String> = HashSet::new();
    let mut assigned = 0;
    for shortcut in shortcuts.iter_mut() {
        let usable = shortcut
            .id()
            .is_some_and(|id| !id.is_empty() && !seen.contains(id));
        if !usable {
            shortcut.id = Some(new_shortcut_id());
            assigned += 1;
        }
        if let Some(id) = &shortcut.id {
            seen.insert(id.clone());
        }
    }
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcuts::packs::find_pack;
    use crate::storage::{KeyValueStore, MemoryStorage};

    fn store_with(storage: Arc<MemoryStorage>) -> ShortcutStore {
        ShortcutStore::new(ShortcutPersistence::new(storage, 102_400))
    }

    #[test]
    fn first_run_is_absent_not_empty() {
        let mut store = store_with(Arc::new(MemoryStorage::new()));
        assert_eq!(store.state(), StoreState::Uninitialized);
        assert_eq!(store.initialize(), LoadOutcome::Absent);
        assert_eq!(store.state(), StoreState::Loaded);
    }

    #[test]
    fn saved_empty_list_loads_as_empty() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = store_with(storage.clone());
        store.replace_all(Vec::new());
        store.persist().unwrap();

        let mut fresh = store_with(storage);
        assert_eq!(
            fresh.initialize(),
            LoadOutcome::Loaded {
                area: StorageArea::Sync,
                count: 0
            }
        );
    }

    #[test]
    fn edits_are_dirty_until_persisted() {
        let mut store = store_with(Arc::new(MemoryStorage::new()));
        store.initialize();
        let id = store.add(Shortcut::new("J", "scrolldown"));
        assert_eq!(store.state(), StoreState::Dirty);
        assert_eq!(store.get(&id).unwrap().key, "j");

        assert!(store.resolve("https://a.com").is_empty());
        assert_eq!(store.resolve_optimistic("https://a.com").len(), 1);

        store.persist().unwrap();
        assert_eq!(store.state(), StoreState::Persisted);
        assert_eq!(store.resolve("https://a.com").len(), 1);
    }

    #[test]
    fn failed_save_keeps_last_good_list() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = store_with(storage.clone());
        store.initialize();
        store.add(Shortcut::new("j", "scrolldown"));
        store.persist().unwrap();

        store.add(Shortcut::new("k", "scrollup"));
        storage.set_available(StorageArea::Sync, false);
        storage.set_available(StorageArea::Local, false);
        assert!(store.persist().is_err());
        assert!(store.is_dirty());
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(store.resolve("https://a.com").len(), 1);
    }

    #[test]
    fn unreadable_storage_keeps_last_good_list() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = store_with(storage.clone());
        store.initialize();
        store.add(Shortcut::new("j", "scrolldown"));
        store.persist().unwrap();

        storage.set_available(StorageArea::Sync, false);
        storage.set_available(StorageArea::Local, false);
        assert_eq!(store.reload(), LoadOutcome::Unavailable);
        assert_eq!(store.state(), StoreState::Persisted);
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(store.shortcuts().len(), 1);
        assert_eq!(store.resolve("https://a.com").len(), 1);

        storage.set_available(StorageArea::Sync, true);
        storage.set_available(StorageArea::Local, true);
        assert_eq!(
            store.reload(),
            LoadOutcome::Loaded {
                area: StorageArea::Sync,
                count: 1
            }
        );
    }

    #[test]
    fn first_load_with_unreadable_storage_is_not_first_run() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_available(StorageArea::Sync, false);
        storage.set_available(StorageArea::Local, false);
        let mut store = store_with(storage);
        assert_eq!(store.initialize(), LoadOutcome::Unavailable);
        assert_eq!(store.state(), StoreState::Loaded);
        assert!(store.shortcuts().is_empty());
    }

    #[test]
    fn reload_is_deferred_while_dirty() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = store_with(storage);
        store.initialize();
        store.add(Shortcut::new("j", "scrolldown"));
        assert_eq!(store.reload(), LoadOutcome::Deferred);
        assert_eq!(store.shortcuts().len(), 1);

        store.discard_edits();
        assert!(store.shortcuts().is_empty());
        assert_eq!(store.reload(), LoadOutcome::Absent);
    }

    #[test]
    fn corrupt_data_keeps_previous_list() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = store_with(storage.clone());
        store.initialize();
        store.add(Shortcut::new("j", "scrolldown"));
        store.persist().unwrap();

        storage
            .set(StorageArea::Sync, crate::shortcuts::SHORTCUTS_KEY, "{broken")
            .unwrap();
        assert_eq!(
            store.reload(),
            LoadOutcome::Corrupt {
                area: StorageArea::Sync
            }
        );
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn loading_assigns_missing_and_duplicate_ids() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                StorageArea::Sync,
                crate::shortcuts::SHORTCUTS_KEY,
                r#"[{"key":"J","action":"top","id":"a"},{"key":"k","action":"bottom","id":"a"},{"key":"l","action":"back"}]"#,
            )
            .unwrap();
        let mut store = store_with(storage);
        store.initialize();

        let ids: HashSet<&str> = store.shortcuts().iter().filter_map(|s| s.id()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(store.shortcuts()[0].id(), Some("a"));
        assert_eq!(store.shortcuts()[0].key, "j");
    }

    #[test]
    fn update_cannot_change_id() {
        let mut store = store_with(Arc::new(MemoryStorage::new()));
        let id = store.add(Shortcut::new("j", "top"));
        assert!(store.update(&id, |s| {
            s.id = Some("other".to_string());
            s.key = "Shift+J".to_string();
        }));
        let updated = store.get(&id).unwrap();
        assert_eq!(updated.key, "shift+j");
        assert!(!store.update("missing", |_| {}));
    }

    #[test]
    fn add_replaces_colliding_id() {
        let mut store = store_with(Arc::new(MemoryStorage::new()));
        let first = store.add(Shortcut::new("j", "top").with_id("x"));
        let second = store.add(Shortcut::new("k", "top").with_id("x"));
        assert_eq!(first, "x");
        assert_ne!(second, "x");
    }

    #[test]
    fn import_and_pack_install_mark_dirty_only_on_change() {
        let mut store = store_with(Arc::new(MemoryStorage::new()));
        store.initialize();
        let pack = find_pack("Tab management").unwrap();
        let report = store.install_pack(&pack, ConflictMode::Skip);
        assert_eq!(report.added.len(), pack.shortcuts.len());
        store.persist().unwrap();

        store.install_pack(&pack, ConflictMode::Skip);
        assert_eq!(store.state(), StoreState::Persisted);

        store.import(vec![Shortcut::new("alt+t", "nexttab")], ConflictMode::Replace);
        assert!(store.is_dirty());
        assert_eq!(store.shortcuts()[0].action.as_str(), "nexttab");
    }

    #[test]
    fn set_enabled_and_remove() {
        let mut store = store_with(Arc::new(MemoryStorage::new()));
        let id = store.add(Shortcut::new("j", "top"));
        assert!(store.set_enabled(&id, false));
        assert!(store.resolve_optimistic("https://a.com").is_empty());
        assert_eq!(store.remove(&id).map(|s| s.key), Some("j".to_string()));
        assert!(store.remove(&id).is_none());
    }

    #[test]
    fn shared_store_is_usable_across_handles() {
        let shared = store_with(Arc::new(MemoryStorage::new())).into_shared();
        let other = Arc::clone(&shared);
        other.lock().add(Shortcut::new("j", "top"));
        assert_eq!(shared.lock().shortcuts().len(), 1);
    }
}
