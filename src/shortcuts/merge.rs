//! Merging an incoming batch of shortcuts into an existing list.
//!
//! Used by manual import, pack installation and cross-device reconciliation.
//! Existing entries keep their list position; new entries are appended.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::types::{new_shortcut_id, Shortcut};

/// What to do when an incoming shortcut uses a key already bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictMode {
    /// Overwrite the existing entry in place, keeping its id.
    #[default]
    Replace,
    /// Keep the existing entry and drop the incoming one.
    Skip,
}

impl std::str::FromStr for ConflictMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(ConflictMode::Replace),
            "skip" => Ok(ConflictMode::Skip),
            other => Err(format!("unknown conflict mode '{}'", other)),
        }
    }
}

/// Result of a merge: the new list plus what happened to each incoming entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeReport {
    pub merged: Vec<Shortcut>,
    /// Ids of appended shortcuts.
    pub added: Vec<String>,
    /// Ids of existing shortcuts overwritten in place.
    pub replaced: Vec<String>,
    /// Keys of incoming shortcuts dropped because the key was taken.
    pub skipped: Vec<String>,
    /// Incoming shortcuts with no usable key combination.
    pub rejected: usize,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.replaced.is_empty()
    }
}

/// Merge `incoming` into `existing` under `mode`.
///
/// Conflicts are detected by canonical key against the existing list and
/// against entries appended earlier in the same batch, so a key is never
/// appended twice. When the existing list binds a key more than once the
/// first entry is the one replaced. Appended entries get a fresh id when
/// theirs is missing or already taken.
pub fn merge(existing: &[Shortcut], incoming: Vec<Shortcut>, mode: ConflictMode) -> MergeReport {
    let mut report = MergeReport {
        merged: existing.to_vec(),
        ..Default::default()
    };

    let mut by_key: HashMap<String, usize> = HashMap::new();
    for (index, shortcut) in existing.iter().enumerate() {
        by_key.entry(shortcut.key.clone()).or_insert(index);
    }
    let mut ids: HashSet<String> = existing.iter().filter_map(|s| s.id.clone()).collect();

    for mut shortcut in incoming {
        shortcut.canonicalize();
        if shortcut.key.is_empty() {
            debug!(action = %shortcut.action, "Dropping incoming shortcut without a key");
            report.rejected += 1;
            continue;
        }

        match by_key.get(&shortcut.key) {
            Some(&index) => match mode {
                ConflictMode::Replace => {
                    let id = match report.merged[index].id.clone() {
                        Some(id) => id,
                        None => {
                            let id = new_shortcut_id();
                            ids.insert(id.clone());
                            id
                        }
                    };
                    shortcut.id = Some(id.clone());
                    report.merged[index] = shortcut;
                    // Entries appended by this batch are already in `added`.
                    if index < existing.len() {
                        report.replaced.push(id);
                    }
                }
                ConflictMode::Skip => report.skipped.push(shortcut.key),
            },
            None => {
                let id = match shortcut.id.take() {
                    Some(id) if !id.is_empty() && !ids.contains(&id) => id,
                    _ => new_shortcut_id(),
                };
                ids.insert(id.clone());
                shortcut.id = Some(id.clone());
                by_key.insert(shortcut.key.clone(), report.merged.len());
                report.merged.push(shortcut);
                report.added.push(id);
            }
        }
    }

    info!(
        event_type = "shortcut_merge",
        mode = ?mode,
        added = report.added.len(),
        replaced = report.replaced.len(),
        skipped = report.skipped.len(),
        rejected = report.rejected,
        "Merged incoming shortcuts"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> Vec<Shortcut> {
        vec![
            Shortcut::new("j", "newtab").with_id("x"),
            Shortcut::new("k", "closetab").with_id("y"),
        ]
    }

    #[test]
    fn skip_keeps_existing_entry() {
        let report = merge(
            &existing(),
            vec![Shortcut::new("j", "scrolldown")],
            ConflictMode::Skip,
        );
        assert_eq!(report.merged.len(), 2);
        assert_eq!(report.merged[0].action.as_str(), "newtab");
        assert_eq!(report.merged[0].id(), Some("x"));
        assert_eq!(report.skipped, vec!["j".to_string()]);
        assert!(!report.changed());
    }

    #[test]
    fn replace_overwrites_in_place_and_keeps_id() {
        let report = merge(
            &existing(),
            vec![Shortcut::new("j", "scrolldown").with_id("incoming")],
            ConflictMode::Replace,
        );
        assert_eq!(report.merged.len(), 2);
        assert_eq!(report.merged[0].action.as_str(), "scrolldown");
        assert_eq!(report.merged[0].id(), Some("x"));
        assert_eq!(report.merged[1].id(), Some("y"));
        assert_eq!(report.replaced, vec!["x".to_string()]);
    }

    #[test]
    fn new_keys_are_appended_with_fresh_ids() {
        let report = merge(
            &existing(),
            vec![Shortcut::new("l", "top"), Shortcut::new("m", "bottom").with_id("x")],
            ConflictMode::Replace,
        );
        assert_eq!(report.merged.len(), 4);
        assert_eq!(report.merged[2].key, "l");
        assert_eq!(report.merged[3].key, "m");
        let new_id = report.merged[3].id().unwrap();
        assert_ne!(new_id, "x");
        assert!(report.merged[2].id().is_some());
        assert_eq!(report.added.len(), 2);
    }

    #[test]
    fn incoming_keys_are_normalized_before_lookup() {
        let report = merge(
            &[Shortcut::new("ctrl+shift+k", "top").with_id("a")],
            vec![Shortcut::new("Shift+Ctrl+K", "bottom")],
            ConflictMode::Replace,
        );
        assert_eq!(report.merged.len(), 1);
        assert_eq!(report.merged[0].action.as_str(), "bottom");
    }

    #[test]
    fn keyless_incoming_is_rejected() {
        let mut bad = Shortcut::new("j", "top");
        bad.key = "ctrl+".to_string();
        let report = merge(&existing(), vec![bad], ConflictMode::Replace);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.merged.len(), 2);
    }

    #[test]
    fn duplicate_incoming_keys_skip_after_first() {
        let report = merge(
            &existing(),
            vec![Shortcut::new("l", "top"), Shortcut::new("L", "bottom")],
            ConflictMode::Skip,
        );
        assert_eq!(report.merged.len(), 3);
        assert_eq!(report.merged[2].action.as_str(), "top");
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.skipped, vec!["l".to_string()]);
    }

    #[test]
    fn duplicate_incoming_keys_replace_the_appended_entry() {
        let report = merge(
            &existing(),
            vec![Shortcut::new("l", "top"), Shortcut::new("l", "bottom")],
            ConflictMode::Replace,
        );
        assert_eq!(report.merged.len(), 3);
        assert_eq!(report.merged[2].action.as_str(), "bottom");
        assert_eq!(report.merged[2].id(), Some(report.added[0].as_str()));
        assert_eq!(report.added.len(), 1);
        assert!(report.replaced.is_empty());
    }

    #[test]
    fn merging_into_empty_list_keeps_incoming_order() {
        let report = merge(
            &[],
            vec![Shortcut::new("a", "top"), Shortcut::new("b", "bottom")],
            ConflictMode::Skip,
        );
        let keys: Vec<&str> = report.merged.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
