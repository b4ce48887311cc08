//! Key-combination parsing, canonical form and platform-aware display.
//!
//! This module provides:
//! - `KeyCombo` - a parsed combination (modifier set + terminal key)
//! - `normalize` / `parse_key_combo` - pure parsing of stored combo strings
//! - `CapturedKey` - conversion of a live key event into a combo, including
//!   the "meta assists ctrl" rule
//!
//! Canonical strings are lower-case, modifiers sorted alphabetically
//! (`alt`, `ctrl`, `meta`, `shift`), joined by `+`, key last.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A modifier key. Declaration order is the canonical sort order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Alt,
    Ctrl,
    Meta,
    Shift,
}

impl Modifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Alt => "alt",
            Modifier::Ctrl => "ctrl",
            Modifier::Meta => "meta",
            Modifier::Shift => "shift",
        }
    }

    /// Recognize a lower-cased modifier token. `cmd` is an alias for `meta`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "alt" => Some(Modifier::Alt),
            "ctrl" => Some(Modifier::Ctrl),
            "meta" | "cmd" => Some(Modifier::Meta),
            "shift" => Some(Modifier::Shift),
            _ => None,
        }
    }
}

/// Platform enum for display formatting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    MacOS,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        #[cfg(target_os = "macos")]
        {
            Platform::MacOS
        }
        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            Platform::Linux
        }
    }
}

/// A parsed key combination.
///
/// An empty combo (no modifiers, no key) is what invalid input parses to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub modifiers: BTreeSet<Modifier>,
    pub key: Option<String>,
}

impl KeyCombo {
    /// Parse a stored combo string.
    ///
    /// Tokens are split on `+`, trimmed and lower-cased. Repeated modifiers
    /// collapse, and when several non-modifier tokens appear the last one
    /// wins. Input without a terminal key yields an empty combo.
    pub fn parse(raw: &str) -> Self {
        let mut combo = KeyCombo::default();

        for token in raw.split('+') {
            let token = token.trim().to_lowercase();
            if token.is_empty() {
                continue;
            }
            match Modifier::from_token(&token) {
                Some(modifier) => {
                    combo.modifiers.insert(modifier);
                }
                None => combo.key = Some(token),
            }
        }

        if combo.key.is_none() {
            return KeyCombo::default();
        }
        combo
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_none()
    }

    pub fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Canonical storage form, or an empty string for an empty combo.
    pub fn to_canonical_string(&self) -> String {
        let Some(key) = &self.key else {
            return String::new();
        };
        let mut parts: Vec<&str> = self.modifiers.iter().map(Modifier::as_str).collect();
        parts.push(key);
        parts.join("+")
    }

    pub fn display(&self) -> String {
        self.display_for_platform(Platform::current())
    }

    pub fn display_for_platform(&self, platform: Platform) -> String {
        let Some(key) = &self.key else {
            return String::new();
        };
        match platform {
            Platform::MacOS => {
                let mut s = String::new();
                if self.has(Modifier::Ctrl) {
                    s.push('⌃');
                }
                if self.has(Modifier::Alt) {
                    s.push('⌥');
                }
                if self.has(Modifier::Shift) {
                    s.push('⇧');
                }
                if self.has(Modifier::Meta) {
                    s.push('⌘');
                }
                s.push_str(&key_symbol(key));
                s
            }
            Platform::Windows | Platform::Linux => {
                let mut parts: Vec<String> = Vec::new();
                if self.has(Modifier::Ctrl) {
                    parts.push("Ctrl".to_string());
                }
                if self.has(Modifier::Alt) {
                    parts.push("Alt".to_string());
                }
                if self.has(Modifier::Shift) {
                    parts.push("Shift".to_string());
                }
                if self.has(Modifier::Meta) {
                    parts.push(if platform == Platform::Windows { "Win" } else { "Super" }.to_string());
                }
                parts.push(key_text(key));
                parts.join("+")
            }
        }
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

/// Decompose a stored combo string into modifier and key parts.
pub fn parse_key_combo(raw: &str) -> KeyCombo {
    KeyCombo::parse(raw)
}

/// Canonicalize a combo string. Invalid input normalizes to `""`.
pub fn normalize(raw: &str) -> String {
    KeyCombo::parse(raw).to_canonical_string()
}

fn key_symbol(key: &str) -> String {
    match key {
        "enter" => "↵",
        "esc" => "⎋",
        "tab" => "⇥",
        "space" => "␣",
        "backspace" => "⌫",
        "del" => "⌦",
        "up" => "↑",
        "down" => "↓",
        "left" => "←",
        "right" => "→",
        "pageup" => "⇞",
        "pagedown" => "⇟",
        k => return k.to_uppercase(),
    }
    .to_string()
}

fn key_text(key: &str) -> String {
    match key {
        "enter" => "Enter",
        "esc" => "Esc",
        "tab" => "Tab",
        "space" => "Space",
        "backspace" => "Backspace",
        "del" => "Delete",
        "up" => "Up",
        "down" => "Down",
        "left" => "Left",
        "right" => "Right",
        "pageup" => "PageUp",
        "pagedown" => "PageDown",
        k => return k.to_uppercase(),
    }
    .to_string()
}

/// Map a key-event key name to the token used in combo strings.
pub fn canonicalize_key(key: &str) -> String {
    if key == " " {
        return "space".to_string();
    }
    let key_lower = key.trim().to_lowercase();
    match key_lower.as_str() {
        "arrowup" => "up",
        "arrowdown" => "down",
        "arrowleft" => "left",
        "arrowright" => "right",
        "escape" => "esc",
        "return" => "enter",
        "delete" => "del",
        "insert" => "ins",
        "+" => "plus",
        "control" => "ctrl",
        "os" | "command" => "meta",
        _ => return key_lower,
    }
    .to_string()
}

/// A key event as delivered by the capture layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapturedKey {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl CapturedKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Convert the event into a combo.
    ///
    /// When both `meta` and `ctrl` are held only `ctrl` is emitted. A press
    /// of a bare modifier key yields an empty combo.
    pub fn to_combo(&self) -> KeyCombo {
        let key = canonicalize_key(&self.key);
        if key.is_empty() || Modifier::from_token(&key).is_some() {
            return KeyCombo::default();
        }

        let mut combo = KeyCombo {
            modifiers: BTreeSet::new(),
            key: Some(key),
        };
        if self.ctrl {
            combo.modifiers.insert(Modifier::Ctrl);
        } else if self.meta {
            combo.modifiers.insert(Modifier::Meta);
        }
        if self.alt {
            combo.modifiers.insert(Modifier::Alt);
        }
        if self.shift {
            combo.modifiers.insert(Modifier::Shift);
        }
        combo
    }

    pub fn to_canonical_string(&self) -> String {
        self.to_combo().to_canonical_string()
    }
}

#[cfg(test)]
#[path = "keycombo_tests.rs"]
mod tests;
