//! Read-only inspection surface: list, search, and detail views over a
//! scene or prefab, built on the same document model as the editors.

use std::sync::LazyLock;

use regex::Regex;

use crate::classes;
use crate::common::{
    ComponentInfo, EngineError, FindResult, GameObjectDetail, GameObjectInfo, PrefabInstanceInfo,
    Result,
};
use crate::document::{prefab_instance_name, Block, Document};
use crate::ops::overrides::modifications_count;
use crate::validate::{validate_file_path, PathMode};

static SCRIPT_GUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"m_Script: \{fileID: \d+, guid: ([a-f0-9]{32})").expect("Invalid regex")
});

static SOURCE_GUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"m_SourcePrefab: \{fileID: \d+, guid: ([a-f0-9]{32})").expect("Invalid regex")
});

fn game_object_info(block: &Block) -> GameObjectInfo {
    GameObjectInfo {
        name: block.get_property("m_Name").unwrap_or_default(),
        file_id: block.file_id().to_string(),
        active: block.get_property("m_IsActive").as_deref() == Some("1"),
        match_score: None,
    }
}

/// Every full GameObject in the file, in block order.
pub fn list_game_objects(file: &str) -> Result<Vec<GameObjectInfo>> {
    validate_file_path(file, PathMode::Read)?;
    let doc = Document::from_file(file, false)?;
    Ok(doc
        .blocks()
        .iter()
        .filter(|b| b.class_id() == classes::GAME_OBJECT && !b.is_stripped())
        .map(game_object_info)
        .collect())
}

/// Every PrefabInstance in the file, named from its `m_Name` modification
/// (`"Variant"` when the modification is absent).
pub fn list_prefab_instances(file: &str) -> Result<Vec<PrefabInstanceInfo>> {
    validate_file_path(file, PathMode::Read)?;
    let doc = Document::from_file(file, false)?;
    Ok(doc
        .find_by_class_id(classes::PREFAB_INSTANCE)
        .into_iter()
        .map(|b| PrefabInstanceInfo {
            name: prefab_instance_name(b).unwrap_or_else(|| "Variant".to_string()),
            file_id: b.file_id().to_string(),
            source_guid: SOURCE_GUID_RE
                .captures(b.raw())
                .map(|c| c[1].to_string())
                .unwrap_or_default(),
            modifications_count: modifications_count(b),
        })
        .collect())
}

/// Rank a case-folded substring hit on a 0..=1 scale: the score is the share
/// of the candidate name the pattern covers, discounted by how far from the
/// start the match begins. An exact match scores 1.0; `"cam"` against
/// `"main camera"` scores well below `"cam"` against `"camera"`.
fn match_score(pattern: &str, text: &str) -> f64 {
    let Some(hit) = text.find(pattern) else {
        return 0.0;
    };
    let pattern_len = pattern.chars().count() as f64;
    let text_len = text.chars().count() as f64;
    if pattern_len == 0.0 || text_len == 0.0 {
        return 0.0;
    }
    let coverage = pattern_len / text_len;
    let offset = text[..hit].chars().count() as f64 / text_len;
    coverage * (1.0 - offset / 2.0)
}

/// Search GameObjects and PrefabInstances by name. Exact matching compares
/// names verbatim; fuzzy matching is case-insensitive substring search with
/// better matches ranked first.
pub fn find_by_name(file: &str, pattern: &str, fuzzy: bool) -> Result<Vec<FindResult>> {
    validate_file_path(file, PathMode::Read)?;
    let doc = Document::from_file(file, false)?;
    let mut results: Vec<FindResult> = Vec::new();

    let gameobjects: Vec<GameObjectInfo> = doc
        .blocks()
        .iter()
        .filter(|b| b.class_id() == classes::GAME_OBJECT && !b.is_stripped())
        .map(game_object_info)
        .collect();
    let prefabs = doc.find_by_class_id(classes::PREFAB_INSTANCE);

    if fuzzy {
        let needle = pattern.to_lowercase();
        for go in &gameobjects {
            let hay = go.name.to_lowercase();
            if hay.contains(&needle) {
                results.push(FindResult::from_game_object(go, Some(match_score(&needle, &hay))));
            }
        }
        for pi in prefabs {
            let name = prefab_instance_name(pi).unwrap_or_else(|| "Variant".to_string());
            let hay = name.to_lowercase();
            if hay.contains(&needle) {
                let info = PrefabInstanceInfo {
                    name,
                    file_id: pi.file_id().to_string(),
                    source_guid: SOURCE_GUID_RE
                        .captures(pi.raw())
                        .map(|c| c[1].to_string())
                        .unwrap_or_default(),
                    modifications_count: modifications_count(pi),
                };
                results.push(FindResult::from_prefab_instance(
                    &info,
                    Some(match_score(&needle, &hay)),
                ));
            }
        }
        results.sort_by(|a, b| {
            b.match_score
                .unwrap_or(0.0)
                .partial_cmp(&a.match_score.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    } else {
        for go in &gameobjects {
            if go.name == pattern {
                results.push(FindResult::from_game_object(go, None));
            }
        }
        for pi in prefabs {
            let name = prefab_instance_name(pi).unwrap_or_else(|| "Variant".to_string());
            if name == pattern {
                let info = PrefabInstanceInfo {
                    name,
                    file_id: pi.file_id().to_string(),
                    source_guid: SOURCE_GUID_RE
                        .captures(pi.raw())
                        .map(|c| c[1].to_string())
                        .unwrap_or_default(),
                    modifications_count: modifications_count(pi),
                };
                results.push(FindResult::from_prefab_instance(&info, None));
            }
        }
    }
    Ok(results)
}

/// Full detail for one GameObject: tag, layer, hierarchy links, and its
/// component list with script GUIDs where present.
pub fn inspect_game_object(file: &str, identifier: &str) -> Result<GameObjectDetail> {
    validate_file_path(file, PathMode::Read)?;
    let doc = Document::from_file(file, false)?;
    let go_id = doc.require_unique_game_object(identifier)?;
    let block = doc
        .find_by_file_id(&go_id)
        .ok_or_else(|| EngineError::not_found("GameObject", go_id.clone()))?;
    let info = game_object_info(block);
    let tag = block
        .get_property("m_TagString")
        .unwrap_or_else(|| "Untagged".to_string());
    let layer = block
        .get_property("m_Layer")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let components: Vec<ComponentInfo> = doc
        .component_ids_of(&go_id)
        .iter()
        .filter_map(|id| doc.find_by_file_id(id))
        .map(|b| ComponentInfo {
            type_name: b
                .type_name()
                .map(str::to_string)
                .or_else(|| classes::class_name_of(b.class_id()).map(str::to_string))
                .unwrap_or_else(|| format!("Class{}", b.class_id())),
            class_id: b.class_id(),
            file_id: b.file_id().to_string(),
            script_guid: if classes::is_script_container(b.class_id()) {
                SCRIPT_GUID_RE.captures(b.raw()).map(|c| c[1].to_string())
            } else {
                None
            },
        })
        .collect();

    let (parent, children) = match doc.transform_of_game_object(&go_id) {
        Ok(tf) => (
            doc.parent_of(&tf).filter(|p| p != "0"),
            doc.children_of(&tf),
        ),
        Err(_) => (None, Vec::new()),
    };

    Ok(GameObjectDetail {
        name: info.name,
        file_id: info.file_id,
        active: info.active,
        tag,
        layer,
        components,
        children: if children.is_empty() {
            None
        } else {
            Some(children)
        },
        parent_transform_id: parent,
    })
}
