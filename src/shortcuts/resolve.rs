//! Per-page resolution of eligible shortcuts.
//!
//! Resolution is a pure function of a shortcut list snapshot and a URL.
//! The result borrows the snapshot, so it cannot outlive or mutate it, and
//! it must be recomputed whenever either input changes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::keycombo;
use super::policy::{self, FocusContext};
use super::types::Shortcut;

/// How the host key-binding layer handles several shortcuts on one combo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingPolicy {
    /// Every eligible shortcut for a combo fires, in list order.
    #[default]
    AllFire,
    /// Only the first-registered eligible shortcut binds the combo.
    FirstWins,
}

/// One combo and the shortcuts bound to it, in list order.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding<'a> {
    pub combo: &'a str,
    pub handlers: Vec<&'a Shortcut>,
}

/// Ordered, read-only set of shortcuts eligible on one page.
#[derive(Clone, Debug)]
pub struct Resolved<'a> {
    url: String,
    shortcuts: Vec<&'a Shortcut>,
}

impl<'a> Resolved<'a> {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn len(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Shortcut> + '_ {
        self.shortcuts.iter().copied()
    }

    pub fn as_slice(&self) -> &[&'a Shortcut] {
        &self.shortcuts
    }

    /// Group eligible shortcuts by combo, in order of first appearance.
    pub fn bindings(&self, binding_policy: BindingPolicy) -> Vec<Binding<'a>> {
        let mut bindings: Vec<Binding<'a>> = Vec::new();
        let mut index_by_combo: HashMap<&'a str, usize> = HashMap::new();

        for &shortcut in &self.shortcuts {
            let combo = shortcut.key.as_str();
            match index_by_combo.get(combo) {
                Some(&index) => {
                    if binding_policy == BindingPolicy::AllFire {
                        bindings[index].handlers.push(shortcut);
                    }
                }
                None => {
                    index_by_combo.insert(combo, bindings.len());
                    bindings.push(Binding {
                        combo,
                        handlers: vec![shortcut],
                    });
                }
            }
        }
        bindings
    }

    /// Shortcuts that should run for a key event.
    ///
    /// `combo` may be any spelling; it is normalized first. With
    /// `FirstWins` the first bound shortcut owns the combo even when the
    /// focus rule then suppresses it.
    pub fn handlers_for(
        &self,
        combo: &str,
        focus: FocusContext,
        binding_policy: BindingPolicy,
    ) -> Vec<&'a Shortcut> {
        let combo = keycombo::normalize(combo);
        if combo.is_empty() {
            return Vec::new();
        }
        let mut bound = self.shortcuts.iter().copied().filter(|s| s.key == combo);
        let candidates: Vec<&'a Shortcut> = match binding_policy {
            BindingPolicy::AllFire => bound.collect(),
            BindingPolicy::FirstWins => bound.next().into_iter().collect(),
        };
        candidates
            .into_iter()
            .filter(|s| policy::should_fire(s, &self.url, focus))
            .collect()
    }
}

/// Compute the shortcuts eligible to fire on `url`.
///
/// Drops disabled shortcuts and those the site filter rejects; the
/// remaining ones keep their list order.
pub fn resolve<'a>(shortcuts: &'a [Shortcut], url: &str) -> Resolved<'a> {
    let eligible: Vec<&'a Shortcut> = shortcuts
        .iter()
        .filter(|s| s.enabled)
        .filter(|s| policy::is_allowed(s, url))
        .collect();

    debug!(
        url = url,
        total = shortcuts.len(),
        eligible = eligible.len(),
        "Resolved shortcuts for page"
    );

    Resolved {
        url: url.to_string(),
        shortcuts: eligible,
    }
}
