//! Predefined shortcut packs.
//!
//! A pack is a named bundle of shortcuts installed through the conflict
//! resolver. Newly added entries are grouped under the pack's name.

use std::collections::HashSet;

use tracing::info;

use super::merge::{merge, ConflictMode, MergeReport};
use super::types::{Shortcut, SiteFilterMode};

#[derive(Clone, Debug, PartialEq)]
pub struct ShortcutPack {
    pub name: String,
    pub description: String,
    pub shortcuts: Vec<Shortcut>,
}

impl ShortcutPack {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            shortcuts: Vec::new(),
        }
    }

    fn with(mut self, shortcut: Shortcut) -> Self {
        self.shortcuts.push(shortcut);
        self
    }
}

/// Install `pack` into `existing`.
///
/// Every shortcut the merge appends is stamped with the pack name as its
/// group; replaced or skipped entries are left as they were merged.
pub fn install_pack(existing: &[Shortcut], pack: &ShortcutPack, mode: ConflictMode) -> MergeReport {
    let mut report = merge(existing, pack.shortcuts.clone(), mode);

    let added: HashSet<&str> = report.added.iter().map(String::as_str).collect();
    for shortcut in report.merged.iter_mut() {
        if shortcut.id().is_some_and(|id| added.contains(id)) {
            shortcut.group = Some(pack.name.clone());
        }
    }

    info!(
        event_type = "pack_install",
        pack = %pack.name,
        added = report.added.len(),
        skipped = report.skipped.len(),
        "Installed shortcut pack"
    );
    report
}

/// The packs shipped with the engine.
pub fn builtin_packs() -> Vec<ShortcutPack> {
    vec![
        ShortcutPack::new("Vim navigation", "Scroll and move between tabs with Vim keys")
            .with(Shortcut::new("j", "scrolldown"))
            .with(Shortcut::new("k", "scrollup"))
            .with(Shortcut::new("h", "scrollleft"))
            .with(Shortcut::new("l", "scrollright"))
            .with(Shortcut::new("shift+g", "bottom"))
            .with(Shortcut::new("g g", "top"))
            .with(Shortcut::new("shift+j", "prevtab"))
            .with(Shortcut::new("shift+k", "nexttab"))
            .with(Shortcut::new("shift+h", "back"))
            .with(Shortcut::new("shift+l", "forward")),
        ShortcutPack::new("Tab management", "Open, close, pin and reorder tabs")
            .with(Shortcut::new("alt+t", "newtab"))
            .with(Shortcut::new("alt+w", "closetab"))
            .with(Shortcut::new("alt+shift+t", "reopentab"))
            .with(Shortcut::new("alt+d", "clonetab"))
            .with(Shortcut::new("alt+p", "togglepin"))
            .with(Shortcut::new("alt+m", "togglemute")),
        ShortcutPack::new("Reading", "Page-wise scrolling outside of text fields")
            .with(Shortcut::new("space", "pagedown"))
            .with(Shortcut::new("shift+space", "pageup"))
            .with(
                Shortcut::new("n", "buttonnextpage")
                    .with_payload("button", "a[rel=next]")
                    .with_sites(SiteFilterMode::Blocklist, &["*docs.google.com*"]),
            ),
    ]
}

/// Look a built-in pack up by name, ignoring case.
pub fn find_pack(name: &str) -> Option<ShortcutPack> {
    builtin_packs()
        .into_iter()
        .find(|pack| pack.name.eq_ignore_ascii_case(name.trim()))
}
