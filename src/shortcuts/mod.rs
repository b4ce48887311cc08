//! Per-site keyboard shortcuts.
//!
//! This module provides:
//! - Key combo normalization and platform-aware display
//! - URL matching with globs and `/regex/` patterns
//! - Per-shortcut site policy (blocklist / allowlist)
//! - Merging imported lists and installing packs
//! - Resolving the shortcuts active on a page
//! - Persistence across the sync and local storage areas
//!
//! # Example
//!
//! ```ignore
//! use shortkeys::shortcuts::{resolve, Shortcut, SiteFilterMode};
//!
//! let list = vec![
//!     Shortcut::new("Ctrl+Shift+K", "newtab")
//!         .with_sites(SiteFilterMode::Blocklist, &["*mail.google.com*"]),
//! ];
//! let active = resolve(&list, "https://example.com/");
//! assert_eq!(active.len(), 1);
//! assert_eq!(list[0].key, "ctrl+shift+k");
//! ```

mod codec;
pub mod glob;
mod keycombo;
mod merge;
mod packs;
mod persistence;
mod policy;
mod resolve;
mod store;
mod types;

pub use codec::{export_shortcuts, parse_import, parse_shortcuts, serialize_shortcuts};
pub use glob::{Matcher, PatternError};
pub use keycombo::{
    canonicalize_key, normalize, parse_key_combo, CapturedKey, KeyCombo, Modifier, Platform,
};
pub use merge::{merge, ConflictMode, MergeReport};
pub use packs::{builtin_packs, find_pack, install_pack, ShortcutPack};
pub use persistence::{
    FallbackReason, MigrationOutcome, SaveOutcome, ShortcutChanges, ShortcutPersistence,
    StoreError, StoredList, MIGRATION_FLAG_KEY, SHORTCUTS_KEY,
};
pub use policy::{is_allowed, should_fire, FocusContext};
pub use resolve::{resolve, Binding, BindingPolicy, Resolved};
pub use store::{ensure_unique_ids, LoadOutcome, SharedStore, ShortcutStore, StoreState};
pub use types::{new_shortcut_id, split_sites, Action, ActionCategory, Shortcut, SiteFilterMode};
