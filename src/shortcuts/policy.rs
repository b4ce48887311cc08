//! Site applicability and the "should this fire" decision.
//!
//! The key-binding layer calls [`should_fire`] explicitly for every
//! candidate instead of hooking a library's internal stop callback.

use super::glob;
use super::types::{Shortcut, SiteFilterMode};

/// Where keyboard focus sits when a key event arrives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FocusContext {
    #[default]
    Page,
    /// An input, textarea, select or contenteditable element.
    Editable,
}

impl FocusContext {
    pub fn from_element(tag_name: &str, content_editable: bool) -> Self {
        if content_editable {
            return FocusContext::Editable;
        }
        match tag_name.to_ascii_lowercase().as_str() {
            "input" | "textarea" | "select" => FocusContext::Editable,
            _ => FocusContext::Page,
        }
    }
}

/// Apply the shortcut's site filter to `url`.
///
/// Block-list mode starts allowed and every matching pattern flips the
/// state, so an even number of matches restores it. Allow-list mode is
/// allowed iff any pattern matches.
pub fn is_allowed(shortcut: &Shortcut, url: &str) -> bool {
    match shortcut.blacklist {
        SiteFilterMode::Off => true,
        SiteFilterMode::Blocklist => shortcut
            .sites_array
            .iter()
            .fold(true, |allowed, site| {
                if glob::matches(site, url) {
                    !allowed
                } else {
                    allowed
                }
            }),
        SiteFilterMode::Allowlist => shortcut
            .sites_array
            .iter()
            .any(|site| glob::matches(site, url)),
    }
}

/// Full firing decision for one candidate on a key event.
pub fn should_fire(shortcut: &Shortcut, url: &str, focus: FocusContext) -> bool {
    if !shortcut.enabled {
        return false;
    }
    if focus == FocusContext::Editable && !shortcut.active_in_inputs {
        return false;
    }
    is_allowed(shortcut, url)
}
