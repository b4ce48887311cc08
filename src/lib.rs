//! Shortkeys - per-site keyboard shortcut resolution and settings sync
//!
//! This library provides key combo normalization, site filtering,
//! conflict-aware merging and dual-area persistence of shortcut lists.

pub mod config;
pub mod error;
pub mod logging;
pub mod shortcuts;
pub mod storage;
