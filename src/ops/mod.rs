//! The operation surface: each function loads one document, mutates it in
//! memory, validates, and saves atomically. Batch edits share the same
//! load-once/save-once discipline.

pub mod component;
pub mod create;
pub mod duplicate;
pub mod inspect;
pub mod overrides;
pub mod remove;
pub mod reparent;
pub mod templates;
pub mod unpack;
pub mod update;

pub use component::{add_component, copy_component, remove_component};
pub use create::{
    create_game_object, create_meta, create_prefab_variant, create_scene,
    create_scriptable_object,
};
pub use duplicate::duplicate_game_object;
pub use inspect::{find_by_name, inspect_game_object, list_game_objects, list_prefab_instances};
pub use overrides::{
    add_prefab_list_entry, edit_prefab_override, remove_prefab_list_entry, remove_prefab_override,
    PrefabListKind,
};
pub use remove::{delete_game_object, delete_prefab_instance};
pub use reparent::reparent;
pub use unpack::unpack_prefab_instance;
pub use update::{
    batch_edit, edit_component_by_file_id, edit_game_object_property, edit_transform, BatchEdit,
};

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::common::{read_unity_file, EngineError, Result};
use crate::document::{Block, Document};

static META_GUID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^guid: ([a-f0-9]{32})").expect("Invalid regex"));

static PREFAB_INSTANCE_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"m_PrefabInstance: \{fileID: (-?\d+)\}").expect("Invalid regex"));

/// Companion meta path of an asset.
pub(crate) fn meta_path_of(path: &str) -> String {
    format!("{path}.meta")
}

/// Asset name derived from a path: the file stem.
pub(crate) fn file_stem_of(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read the `guid:` line of a .meta file.
pub(crate) fn guid_from_meta(meta_path: &str) -> Result<String> {
    let content = read_unity_file(meta_path)?;
    for line in content.lines() {
        if let Some(caps) = META_GUID_RE.captures(line) {
            return Ok(caps[1].to_string());
        }
    }
    Err(EngineError::not_found_hint(
        "guid",
        meta_path,
        "the .meta file has no guid: line",
    ))
}

/// The PrefabInstance a stripped handle block belongs to.
pub(crate) fn prefab_instance_of(block: &Block) -> Option<String> {
    PREFAB_INSTANCE_REF_RE
        .captures(block.raw())
        .map(|c| c[1].to_string())
        .filter(|id| id != "0")
}

/// Resolve a PrefabInstance argument: a file id, or a name matched against
/// each instance's `m_Name` modification.
pub(crate) fn resolve_prefab_instance(doc: &Document, arg: &str) -> Result<String> {
    if !arg.is_empty() && arg.chars().all(|c| c.is_ascii_digit()) {
        let block = doc
            .find_by_file_id(arg)
            .ok_or_else(|| EngineError::not_found("PrefabInstance", arg))?;
        if block.class_id() != crate::classes::PREFAB_INSTANCE {
            return Err(EngineError::not_found_hint(
                "PrefabInstance",
                arg,
                format!("fileID {arg} is class {}, not a PrefabInstance", block.class_id()),
            ));
        }
        return Ok(arg.to_string());
    }
    let mut matches: Vec<String> = doc
        .find_by_class_id(crate::classes::PREFAB_INSTANCE)
        .into_iter()
        .filter(|b| {
            crate::document::prefab_instance_name(b)
                .unwrap_or_else(|| "Variant".to_string())
                == arg
        })
        .map(|b| b.file_id().to_string())
        .collect();
    match matches.len() {
        0 => Err(EngineError::not_found_hint(
            "PrefabInstance",
            arg,
            "no m_Name modification matches",
        )),
        1 => Ok(matches.remove(0)),
        _ => Err(EngineError::AmbiguousName {
            name: arg.to_string(),
            candidates: matches,
        }),
    }
}
