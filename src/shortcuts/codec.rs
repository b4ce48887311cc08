//! Serialized forms of the shortcut list.
//!
//! The stored value is a compact JSON array of shortcut records. Exports
//! are the same array pretty-printed. Imports additionally accept the
//! array encoded as a JSON string, which is how older versions stored it.

use serde_json::Value;

use super::types::Shortcut;

pub fn serialize_shortcuts(shortcuts: &[Shortcut]) -> Result<String, serde_json::Error> {
    serde_json::to_string(shortcuts)
}

pub fn parse_shortcuts(serialized: &str) -> Result<Vec<Shortcut>, serde_json::Error> {
    serde_json::from_str(serialized)
}

pub fn export_shortcuts(shortcuts: &[Shortcut]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(shortcuts)
}

/// Parse user-supplied import text.
pub fn parse_import(text: &str) -> Result<Vec<Shortcut>, serde_json::Error> {
    match serde_json::from_str::<Value>(text.trim())? {
        Value::String(inner) => parse_shortcuts(&inner),
        other => serde_json::from_value(other),
    }
}
