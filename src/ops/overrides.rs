//! PrefabInstance override maintenance: the `m_Modifications` quadruples and
//! the removed/added bookkeeping sub-arrays.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::classes;
use crate::common::{
    DeleteReport, EditOverrideReport, EditReport, EngineError, OverrideAction, Result,
};
use crate::document::{Block, Document};
use crate::ops::resolve_prefab_instance;
use crate::validate::{validate_file_path, PathMode};

static TARGET_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^target: (\{.*\})$").expect("Invalid regex"));

static PROPERTY_PATH_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^propertyPath: (.*)$").expect("Invalid regex"));

const MODIFICATIONS: &str = "m_Modifications";

/// The four bookkeeping lists a PrefabInstance carries besides its property
/// overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefabListKind {
    RemovedComponents,
    RemovedGameObjects,
    AddedGameObjects,
    AddedComponents,
}

impl PrefabListKind {
    pub fn key(self) -> &'static str {
        match self {
            PrefabListKind::RemovedComponents => "m_RemovedComponents",
            PrefabListKind::RemovedGameObjects => "m_RemovedGameObjects",
            PrefabListKind::AddedGameObjects => "m_AddedGameObjects",
            PrefabListKind::AddedComponents => "m_AddedComponents",
        }
    }
}

/// A parsed override quadruple.
#[derive(Debug, Clone)]
struct OverrideEntry {
    target: String,
    property_path: String,
    value: String,
    object_reference: String,
}

impl OverrideEntry {
    fn parse(element: &str) -> Option<OverrideEntry> {
        let target = TARGET_LINE_RE.captures(element)?[1].to_string();
        let property_path = PROPERTY_PATH_LINE_RE.captures(element)?[1].trim().to_string();
        let value = element
            .lines()
            .find_map(|l| l.strip_prefix("value:"))
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        let object_reference = element
            .lines()
            .find_map(|l| l.strip_prefix("objectReference:"))
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| "{fileID: 0}".to_string());
        Some(OverrideEntry {
            target,
            property_path,
            value,
            object_reference,
        })
    }

    fn render(&self) -> String {
        format!(
            "target: {}\npropertyPath: {}\nvalue: {}\nobjectReference: {}",
            self.target, self.property_path, self.value, self.object_reference
        )
    }
}

fn parsed_overrides(block: &Block) -> Vec<(usize, OverrideEntry)> {
    block
        .array_elements(MODIFICATIONS)
        .iter()
        .enumerate()
        .filter_map(|(i, e)| OverrideEntry::parse(e).map(|entry| (i, entry)))
        .collect()
}

/// Add or update one override entry on a PrefabInstance. When the entry is
/// new and no target was supplied, the target is inferred from an existing
/// override on the same root property.
pub fn edit_prefab_override(
    file: &str,
    pi: &str,
    property_path: &str,
    value: &str,
    object_reference: Option<&str>,
    target: Option<&str>,
) -> Result<EditOverrideReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    let pi_id = resolve_prefab_instance(&doc, pi)?;

    let block = doc
        .find_by_file_id(&pi_id)
        .ok_or_else(|| EngineError::not_found("PrefabInstance", pi_id.clone()))?;
    let entries = parsed_overrides(block);
    let existing = entries
        .iter()
        .find(|(_, e)| e.property_path == property_path)
        .cloned();

    let action = match existing {
        Some((idx, mut entry)) => {
            entry.value = value.to_string();
            if let Some(obj) = object_reference {
                entry.object_reference = obj.to_string();
            }
            let block = doc
                .find_by_file_id_mut(&pi_id)
                .ok_or_else(|| EngineError::not_found("PrefabInstance", pi_id.clone()))?;
            block.set_array_element(MODIFICATIONS, idx, &entry.render())?;
            OverrideAction::Updated
        }
        None => {
            let target_text = match target {
                Some(t) => t.to_string(),
                None => infer_target(&entries, property_path).ok_or_else(|| {
                    EngineError::Unavailable {
                        what: format!("override target for '{property_path}'"),
                        hint: "provide --target with this fileID/guid/type".to_string(),
                    }
                })?,
            };
            let entry = OverrideEntry {
                target: target_text,
                property_path: property_path.to_string(),
                value: value.to_string(),
                object_reference: object_reference
                    .unwrap_or("{fileID: 0}")
                    .to_string(),
            };
            let block = doc
                .find_by_file_id_mut(&pi_id)
                .ok_or_else(|| EngineError::not_found("PrefabInstance", pi_id.clone()))?;
            // appending keeps the new quadruple directly before
            // m_RemovedComponents, where Unity writes it
            block.insert_array_element(MODIFICATIONS, -1, &entry.render())?;
            OverrideAction::Added
        }
    };

    doc.validate()?;
    doc.save(None)?;
    debug!(file, %pi_id, property_path, ?action, "edited prefab override");
    Ok(EditOverrideReport {
        action,
        property_path: property_path.to_string(),
    })
}

/// Reuse the target of another override that touches the same root property
/// (`m_LocalPosition.x` and `m_LocalPosition.z` share one target object).
fn infer_target(entries: &[(usize, OverrideEntry)], property_path: &str) -> Option<String> {
    let root = property_path.split('.').next().unwrap_or(property_path);
    entries
        .iter()
        .find(|(_, e)| e.property_path.split('.').next() == Some(root))
        .map(|(_, e)| e.target.clone())
}

/// Remove an override entry by property path (and target, when given).
pub fn remove_prefab_override(
    file: &str,
    pi: &str,
    property_path: &str,
    target: Option<&str>,
) -> Result<DeleteReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    let pi_id = resolve_prefab_instance(&doc, pi)?;
    let block = doc
        .find_by_file_id(&pi_id)
        .ok_or_else(|| EngineError::not_found("PrefabInstance", pi_id.clone()))?;
    let idx = parsed_overrides(block)
        .into_iter()
        .find(|(_, e)| {
            e.property_path == property_path
                && target.map(|t| e.target == t).unwrap_or(true)
        })
        .map(|(i, _)| i)
        .ok_or_else(|| {
            EngineError::not_found_hint(
                "override",
                property_path,
                format!("no m_Modifications entry on PrefabInstance {pi_id} matches"),
            )
        })?;
    let block = doc
        .find_by_file_id_mut(&pi_id)
        .ok_or_else(|| EngineError::not_found("PrefabInstance", pi_id.clone()))?;
    block.remove_array_element(MODIFICATIONS, idx)?;
    doc.validate()?;
    doc.save(None)?;
    Ok(DeleteReport { deleted_count: 1 })
}

/// Append a pre-rendered entry to one of the bookkeeping lists, converting
/// `[]` to block form on first insert.
pub fn add_prefab_list_entry(
    file: &str,
    pi: &str,
    list: PrefabListKind,
    entry: &str,
) -> Result<EditReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    let pi_id = resolve_prefab_instance(&doc, pi)?;
    let block = doc
        .find_by_file_id_mut(&pi_id)
        .ok_or_else(|| EngineError::not_found("PrefabInstance", pi_id.clone()))?;
    block.insert_array_element(list.key(), -1, entry)?;
    doc.validate()?;
    let written = doc.save(None)?;
    Ok(EditReport {
        file: file.to_string(),
        bytes_written: written,
    })
}

/// Remove the first entry of a bookkeeping list containing `matcher`; an
/// emptied list collapses back to `[]`.
pub fn remove_prefab_list_entry(
    file: &str,
    pi: &str,
    list: PrefabListKind,
    matcher: &str,
) -> Result<DeleteReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    let pi_id = resolve_prefab_instance(&doc, pi)?;
    let block = doc
        .find_by_file_id_mut(&pi_id)
        .ok_or_else(|| EngineError::not_found("PrefabInstance", pi_id.clone()))?;
    let idx = block
        .array_elements(list.key())
        .iter()
        .position(|e| e.contains(matcher))
        .ok_or_else(|| {
            EngineError::not_found_hint(
                "list entry",
                matcher,
                format!("nothing in {} matches", list.key()),
            )
        })?;
    block.remove_array_element(list.key(), idx)?;
    doc.validate()?;
    doc.save(None)?;
    Ok(DeleteReport { deleted_count: 1 })
}

/// Non-stripped view of a PrefabInstance's override count, used by the
/// inspection surface.
pub(crate) fn modifications_count(block: &Block) -> u32 {
    if block.class_id() != classes::PREFAB_INSTANCE {
        return 0;
    }
    block.get_array_length(MODIFICATIONS).unwrap_or(0) as u32
}
