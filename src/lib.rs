#![deny(clippy::all)]

//! Format-preserving engine for Unity's YAML dialect.
//!
//! A [`Document`] models one scene, prefab, or asset file as an ordered list
//! of [`Block`]s; edits are text-surgical, so everything an operation does
//! not touch round-trips byte for byte. The functions in [`ops`] cover the
//! full editing surface — creation, property edits, hierarchy changes,
//! prefab overrides, duplication, and unpacking — each loading one file,
//! mutating it in memory, validating, and saving through the atomic writer.

pub mod classes;
pub mod common;
pub mod defaults;
pub mod document;
pub mod ops;
pub mod resolve;
pub mod validate;
pub mod writer;

// Re-export main types
pub use common::*;
pub use document::{Block, Document, PropertyFormat, ValueShape};
pub use ops::*;
pub use resolve::{
    PrefabResolver, ProjectSettingsSource, ScriptField, ScriptInfo, ScriptResolver, UnityVersion,
};

/// Get the version of the engine crate
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
