//! Shortcut records as they are stored and exchanged.
//!
//! Field names follow the persisted JSON layout (`sitesArray`,
//! `activeInInputs`, ...). Action-specific payload fields such as `code`
//! or `openurl` are kept opaque in `payload` and round-trip untouched.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::keycombo;

/// Generate a fresh shortcut id.
pub fn new_shortcut_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Per-shortcut site applicability mode (the `blacklist` field).
///
/// Persisted as absent/`false` (off), `"true"` (block-list) or
/// `"whitelist"` (allow-list). A JSON boolean `true` is read as block-list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SiteFilterMode {
    #[default]
    Off,
    Blocklist,
    Allowlist,
}

impl SiteFilterMode {
    pub fn is_off(&self) -> bool {
        matches!(self, SiteFilterMode::Off)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SiteFilterMode::Off => "false",
            SiteFilterMode::Blocklist => "true",
            SiteFilterMode::Allowlist => "whitelist",
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFilterMode {
    Flag(bool),
    Text(String),
}

impl<'de> Deserialize<'de> for SiteFilterMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mode = match Option::<RawFilterMode>::deserialize(deserializer)? {
            Some(RawFilterMode::Flag(true)) => SiteFilterMode::Blocklist,
            Some(RawFilterMode::Text(text)) => match text.as_str() {
                "true" => SiteFilterMode::Blocklist,
                "whitelist" => SiteFilterMode::Allowlist,
                _ => SiteFilterMode::Off,
            },
            Some(RawFilterMode::Flag(false)) | None => SiteFilterMode::Off,
        };
        Ok(mode)
    }
}

impl Serialize for SiteFilterMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SiteFilterMode::Off => serializer.serialize_bool(false),
            other => serializer.serialize_str(other.as_str()),
        }
    }
}

/// Category for organizing actions in listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionCategory {
    Scrolling,
    Navigation,
    Tabs,
    Windows,
    Scripted,
    Other,
}

/// Action identifier. Unknown identifiers are preserved verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    Top,
    Bottom,
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
    PageUp,
    PageDown,
    Back,
    Forward,
    Reload,
    HardReload,
    NewTab,
    CloseTab,
    ReopenTab,
    NextTab,
    PrevTab,
    FirstTab,
    LastTab,
    GoToTab,
    CloneTab,
    TogglePin,
    ToggleMute,
    NewWindow,
    CloseWindow,
    CopyUrl,
    OpenUrl,
    OpenBookmark,
    JavaScript,
    ButtonNextPage,
    Disable,
    Other(String),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Top => "top",
            Action::Bottom => "bottom",
            Action::ScrollUp => "scrollup",
            Action::ScrollDown => "scrolldown",
            Action::ScrollLeft => "scrollleft",
            Action::ScrollRight => "scrollright",
            Action::PageUp => "pageup",
            Action::PageDown => "pagedown",
            Action::Back => "back",
            Action::Forward => "forward",
            Action::Reload => "reload",
            Action::HardReload => "hardreload",
            Action::NewTab => "newtab",
            Action::CloseTab => "closetab",
            Action::ReopenTab => "reopentab",
            Action::NextTab => "nexttab",
            Action::PrevTab => "prevtab",
            Action::FirstTab => "firsttab",
            Action::LastTab => "lasttab",
            Action::GoToTab => "gototab",
            Action::CloneTab => "clonetab",
            Action::TogglePin => "togglepin",
            Action::ToggleMute => "togglemute",
            Action::NewWindow => "newwindow",
            Action::CloseWindow => "closewindow",
            Action::CopyUrl => "copyurl",
            Action::OpenUrl => "openurl",
            Action::OpenBookmark => "openbookmark",
            Action::JavaScript => "javascript",
            Action::ButtonNextPage => "buttonnextpage",
            Action::Disable => "disable",
            Action::Other(name) => name,
        }
    }

    pub fn category(&self) -> ActionCategory {
        match self {
            Action::Top
            | Action::Bottom
            | Action::ScrollUp
            | Action::ScrollDown
            | Action::ScrollLeft
            | Action::ScrollRight
            | Action::PageUp
            | Action::PageDown => ActionCategory::Scrolling,
            Action::Back
            | Action::Forward
            | Action::Reload
            | Action::HardReload
            | Action::OpenUrl
            | Action::OpenBookmark
            | Action::CopyUrl => ActionCategory::Navigation,
            Action::NewTab
            | Action::CloseTab
            | Action::ReopenTab
            | Action::NextTab
            | Action::PrevTab
            | Action::FirstTab
            | Action::LastTab
            | Action::GoToTab
            | Action::CloneTab
            | Action::TogglePin
            | Action::ToggleMute => ActionCategory::Tabs,
            Action::NewWindow | Action::CloseWindow => ActionCategory::Windows,
            Action::JavaScript | Action::ButtonNextPage => ActionCategory::Scripted,
            Action::Disable | Action::Other(_) => ActionCategory::Other,
        }
    }

    /// Payload field this action cannot run without.
    pub fn required_payload(&self) -> Option<&'static str> {
        match self {
            Action::JavaScript => Some("code"),
            Action::OpenUrl => Some("openurl"),
            Action::ButtonNextPage => Some("button"),
            Action::OpenBookmark => Some("bookmark"),
            _ => None,
        }
    }
}

impl From<String> for Action {
    fn from(name: String) -> Self {
        match name.to_lowercase().as_str() {
            "top" => Action::Top,
            "bottom" => Action::Bottom,
            "scrollup" => Action::ScrollUp,
            "scrolldown" => Action::ScrollDown,
            "scrollleft" => Action::ScrollLeft,
            "scrollright" => Action::ScrollRight,
            "pageup" => Action::PageUp,
            "pagedown" => Action::PageDown,
            "back" => Action::Back,
            "forward" => Action::Forward,
            "reload" => Action::Reload,
            "hardreload" => Action::HardReload,
            "newtab" => Action::NewTab,
            "closetab" => Action::CloseTab,
            "reopentab" => Action::ReopenTab,
            "nexttab" => Action::NextTab,
            "prevtab" => Action::PrevTab,
            "firsttab" => Action::FirstTab,
            "lasttab" => Action::LastTab,
            "gototab" => Action::GoToTab,
            "clonetab" => Action::CloneTab,
            "togglepin" => Action::TogglePin,
            "togglemute" => Action::ToggleMute,
            "newwindow" => Action::NewWindow,
            "closewindow" => Action::CloseWindow,
            "copyurl" => Action::CopyUrl,
            "openurl" => Action::OpenUrl,
            "openbookmark" => Action::OpenBookmark,
            "javascript" => Action::JavaScript,
            "buttonnextpage" => Action::ButtonNextPage,
            "disable" => Action::Disable,
            _ => Action::Other(name),
        }
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Action::from(name.to_string())
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_enabled() -> bool {
    true
}

/// A single user-configured shortcut.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortcut {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub key: String,
    pub action: Action,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "SiteFilterMode::is_off")]
    pub blacklist: SiteFilterMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sites_array: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub active_in_inputs: bool,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Shortcut {
    pub fn new(key: &str, action: impl Into<Action>) -> Self {
        Self {
            id: None,
            key: keycombo::normalize(key),
            action: action.into(),
            enabled: true,
            blacklist: SiteFilterMode::Off,
            sites_array: Vec::new(),
            group: None,
            label: None,
            active_in_inputs: false,
            payload: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_sites(mut self, mode: SiteFilterMode, sites: &[&str]) -> Self {
        self.blacklist = mode;
        self.sites_array = sites.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_payload(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(field.to_string(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn active_in_inputs(mut self) -> Self {
        self.active_in_inputs = true;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn combo(&self) -> keycombo::KeyCombo {
        keycombo::parse_key_combo(&self.key)
    }

    /// Bring the record into its persisted form.
    ///
    /// Normalizes the key, folds a newline-separated `sites` payload field
    /// into `sitesArray`, and clears site patterns when filtering is off.
    pub fn canonicalize(&mut self) {
        self.key = keycombo::normalize(&self.key);

        if let Some(Value::String(text)) = self.payload.remove("sites") {
            if self.sites_array.is_empty() {
                self.sites_array = split_sites(&text);
            }
        }

        if self.blacklist.is_off() {
            self.sites_array.clear();
        }
    }

    /// Payload field required by the action but missing from the record.
    pub fn missing_payload(&self) -> Option<&'static str> {
        let field = self.action.required_payload()?;
        match self.payload.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => None,
            Some(Value::Null) | None | Some(Value::String(_)) => Some(field),
            Some(_) => None,
        }
    }
}

/// Split a newline-separated site list, dropping blank lines.
pub fn split_sites(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
