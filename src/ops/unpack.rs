//! Prefab unpacking: replace a PrefabInstance and its stripped handles with
//! real copies of the source prefab's blocks, overrides applied.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::classes;
use crate::common::{random_file_id, EngineError, Result, UnpackReport};
use crate::document::{Block, Document};
use crate::ops::resolve_prefab_instance;
use crate::resolve::PrefabResolver;
use crate::validate::{validate_file_path, PathMode};

static SOURCE_GUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"m_SourcePrefab: \{fileID: \d+, guid: ([a-f0-9]{32})").expect("Invalid regex")
});

static TRANSFORM_PARENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"m_TransformParent: \{fileID: (-?\d+)\}").expect("Invalid regex")
});

static REF_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{fileID: (-?\d+)").expect("Invalid regex"));

static CORRESPONDING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"m_CorrespondingSourceObject: \{fileID: (-?\d+)").expect("Invalid regex")
});

/// One parsed override from the instance being unpacked.
struct Override {
    target: String,
    property_path: String,
    value: String,
    object_reference: String,
}

fn parse_overrides(block: &Block) -> Vec<Override> {
    block
        .array_elements("m_Modifications")
        .iter()
        .filter_map(|element| {
            let mut target = None;
            let mut property_path = None;
            let mut value = String::new();
            let mut object_reference = "0".to_string();
            for line in element.lines() {
                if let Some(rest) = line.strip_prefix("target:") {
                    target = REF_ID_RE.captures(rest).map(|c| c[1].to_string());
                } else if let Some(rest) = line.strip_prefix("propertyPath:") {
                    property_path = Some(rest.trim().to_string());
                } else if let Some(rest) = line.strip_prefix("value:") {
                    value = rest.trim().to_string();
                } else if let Some(rest) = line.strip_prefix("objectReference:") {
                    if let Some(c) = REF_ID_RE.captures(rest) {
                        object_reference = c[1].to_string();
                    }
                }
            }
            Some(Override {
                target: target?,
                property_path: property_path?,
                value,
                object_reference,
            })
        })
        .collect()
}

/// Replace a PrefabInstance with unpacked copies of its source prefab,
/// rewriting every id through a fresh map and applying the recorded
/// overrides to the copies.
pub fn unpack_prefab_instance(
    file: &str,
    pi: &str,
    project_path: Option<&Path>,
    resolver: &dyn PrefabResolver,
) -> Result<UnpackReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    let pi_id = resolve_prefab_instance(&doc, pi)?;

    let (source_guid, parent_tf, overrides, removed_refs) = {
        let pi_block = doc
            .find_by_file_id(&pi_id)
            .ok_or_else(|| EngineError::not_found("PrefabInstance", pi_id.clone()))?;
        let guid = SOURCE_GUID_RE
            .captures(pi_block.raw())
            .map(|c| c[1].to_string())
            .ok_or_else(|| {
                EngineError::not_found_hint(
                    "source prefab guid",
                    pi_id.clone(),
                    "the PrefabInstance has no m_SourcePrefab reference",
                )
            })?;
        let parent = TRANSFORM_PARENT_RE
            .captures(pi_block.raw())
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| "0".to_string());
        let removed: HashSet<String> = pi_block
            .array_elements("m_RemovedComponents")
            .iter()
            .filter_map(|e| REF_ID_RE.captures(e).map(|c| c[1].to_string()))
            .collect();
        (guid, parent, parse_overrides(pi_block), removed)
    };

    let source_path = resolver
        .resolve_prefab_by_guid(&source_guid, project_path)
        .ok_or_else(|| {
            EngineError::not_found_hint(
                "source prefab",
                source_guid.clone(),
                "cannot resolve the guid to a path; run setup to build the GUID cache or pass a project path",
            )
        })?;
    let source = Document::from_file(&source_path, true)?;
    let source_root = source.find_prefab_root()?;

    // fresh ids for every source object that survives
    let mut map: HashMap<String, String> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    for block in source.blocks() {
        let old = block.file_id();
        if old == "0" || removed_refs.contains(old) {
            continue;
        }
        let new = loop {
            let id = random_file_id();
            if id != "0" && !doc.contains_file_id(&id) && taken.insert(id.clone()) {
                break id;
            }
        };
        map.insert(old.to_string(), new);
    }

    let mut warnings: Vec<String> = Vec::new();
    let mut clones: Vec<Block> = Vec::new();
    for block in source.blocks() {
        let old = block.file_id();
        if old == "0" || removed_refs.contains(old) {
            continue;
        }
        let mut clone = block.clone();
        for (from, to) in &map {
            clone.remap_file_id(from, to);
        }
        for handle_field in [
            "m_CorrespondingSourceObject",
            "m_PrefabInstance",
            "m_PrefabAsset",
        ] {
            if let Some(current) = clone.get_property(handle_field) {
                if current != "{fileID: 0}" {
                    let _ = clone.set_property(handle_field, "{fileID: 0}");
                }
            }
        }
        if clone.class_id() == classes::GAME_OBJECT {
            // drop m_Component entries for components the instance removed
            for removed in &removed_refs {
                let needle = format!("{{fileID: {removed}}}");
                while let Some(idx) = clone
                    .array_elements("m_Component")
                    .iter()
                    .position(|e| e.contains(&needle))
                {
                    clone.remove_array_element("m_Component", idx)?;
                }
            }
        }
        clones.push(clone);
    }

    // apply the recorded overrides through the format-preserving setter
    let clone_index: HashMap<String, usize> = clones
        .iter()
        .enumerate()
        .map(|(i, b)| (b.file_id().to_string(), i))
        .collect();
    for entry in &overrides {
        let Some(mapped) = map.get(&entry.target) else {
            warnings.push(format!(
                "override '{}' targets {}, which is not part of the source prefab",
                entry.property_path, entry.target
            ));
            continue;
        };
        let Some(&idx) = clone_index.get(mapped) else {
            continue;
        };
        let value = if entry.object_reference != "0" {
            let mapped_ref = map
                .get(&entry.object_reference)
                .cloned()
                .unwrap_or_else(|| entry.object_reference.clone());
            format!("{{fileID: {mapped_ref}}}")
        } else {
            entry.value.clone()
        };
        if let Err(e) = clones[idx].set_property(&entry.property_path, &value) {
            warn!(property = %entry.property_path, error = %e, "override not applied");
            warnings.push(format!(
                "override '{}' could not be applied: {e}",
                entry.property_path
            ));
        }
    }

    // stripped handles of this instance, mapped to their unpacked copies
    let pi_ref = format!("m_PrefabInstance: {{fileID: {pi_id}}}");
    let stripped: Vec<(String, u32, Option<String>)> = doc
        .blocks()
        .iter()
        .filter(|b| b.is_stripped() && b.raw().contains(&pi_ref))
        .map(|b| {
            let source_ref = CORRESPONDING_RE
                .captures(b.raw())
                .map(|c| c[1].to_string());
            (b.file_id().to_string(), b.class_id(), source_ref)
        })
        .collect();

    if parent_tf != "0" {
        let children = doc.children_of(&parent_tf);
        for (id, class_id, _) in &stripped {
            if classes::is_hierarchy_provider(*class_id) && children.contains(id) {
                doc.remove_child_from_parent(&parent_tf, id)?;
            }
        }
    }

    let mut closure: HashSet<String> = HashSet::new();
    closure.insert(pi_id.clone());
    closure.extend(stripped.iter().map(|(id, _, _)| id.clone()));
    doc.remove_blocks(&closure);

    // references the host made through stripped handles now point at the
    // unpacked copies
    for (handle_id, _, source_ref) in &stripped {
        if let Some(new_id) = source_ref.as_ref().and_then(|s| map.get(s)) {
            doc.remap_references(handle_id, new_id);
        }
    }

    let new_root_tf = map.get(&source_root.transform_id).cloned().ok_or_else(|| {
        EngineError::not_found("source root Transform", source_root.transform_id.clone())
    })?;
    let new_root_go = map.get(&source_root.go_id).cloned().ok_or_else(|| {
        EngineError::not_found("source root GameObject", source_root.go_id.clone())
    })?;
    let root_order = doc.calculate_root_order(&parent_tf);
    if let Some(&idx) = clone_index.get(&new_root_tf) {
        clones[idx].set_property("m_Father", &format!("{{fileID: {parent_tf}}}"))?;
        let _ = clones[idx].set_property("m_RootOrder", &root_order.to_string());
    }

    let unpacked_count = clones.len();
    for clone in clones {
        doc.append_block(clone);
    }
    if parent_tf != "0" {
        doc.add_child_to_parent(&parent_tf, &new_root_tf)?;
    }

    doc.validate()?;
    doc.save(None)?;
    debug!(file, %pi_id, unpacked_count, "unpacked PrefabInstance");
    Ok(UnpackReport {
        unpacked_count,
        new_root_go_id: new_root_go,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FixedResolver {
        guid: String,
        path: PathBuf,
    }

    impl PrefabResolver for FixedResolver {
        fn resolve_prefab_by_guid(&self, guid: &str, _project: Option<&Path>) -> Option<PathBuf> {
            (guid == self.guid).then(|| self.path.clone())
        }
    }

    const GUID: &str = "a1b2c3d4e5f6789012345678abcdef12";

    fn source_prefab() -> String {
        "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n\
--- !u!1 &100000\nGameObject:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {fileID: 0}\n  m_PrefabInstance: {fileID: 0}\n  m_PrefabAsset: {fileID: 0}\n  serializedVersion: 6\n  m_Component:\n  - component: {fileID: 400000}\n  - component: {fileID: 6500000}\n  m_Layer: 0\n  m_Name: Turret\n  m_TagString: Untagged\n  m_Icon: {fileID: 0}\n  m_NavMeshLayer: 0\n  m_StaticEditorFlags: 0\n  m_IsActive: 1\n\
--- !u!4 &400000\nTransform:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {fileID: 0}\n  m_PrefabInstance: {fileID: 0}\n  m_PrefabAsset: {fileID: 0}\n  m_GameObject: {fileID: 100000}\n  m_LocalRotation: {x: 0, y: 0, z: 0, w: 1}\n  m_LocalPosition: {x: 0, y: 0, z: 0}\n  m_LocalScale: {x: 1, y: 1, z: 1}\n  m_Children: []\n  m_Father: {fileID: 0}\n  m_RootOrder: 0\n  m_LocalEulerAnglesHint: {x: 0, y: 0, z: 0}\n\
--- !u!65 &6500000\nBoxCollider:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {fileID: 0}\n  m_PrefabInstance: {fileID: 0}\n  m_PrefabAsset: {fileID: 0}\n  m_GameObject: {fileID: 100000}\n  m_Material: {fileID: 0}\n  m_IsTrigger: 0\n  m_Enabled: 1\n  serializedVersion: 3\n  m_Size: {x: 1, y: 1, z: 1}\n  m_Center: {x: 0, y: 0, z: 0}\n"
            .to_string()
    }

    fn host_scene() -> String {
        format!(
            "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n\
--- !u!1 &100\nGameObject:\n  m_ObjectHideFlags: 0\n  serializedVersion: 6\n  m_Component:\n  - component: {{fileID: 101}}\n  m_Layer: 0\n  m_Name: Host\n  m_TagString: Untagged\n  m_Icon: {{fileID: 0}}\n  m_NavMeshLayer: 0\n  m_StaticEditorFlags: 0\n  m_IsActive: 1\n\
--- !u!4 &101\nTransform:\n  m_ObjectHideFlags: 0\n  m_GameObject: {{fileID: 100}}\n  m_LocalRotation: {{x: 0, y: 0, z: 0, w: 1}}\n  m_LocalPosition: {{x: 0, y: 0, z: 0}}\n  m_LocalScale: {{x: 1, y: 1, z: 1}}\n  m_Children:\n  - {{fileID: 501}}\n  m_Father: {{fileID: 0}}\n  m_RootOrder: 0\n  m_LocalEulerAnglesHint: {{x: 0, y: 0, z: 0}}\n\
--- !u!1001 &700\nPrefabInstance:\n  m_ObjectHideFlags: 0\n  serializedVersion: 2\n  m_Modification:\n    serializedVersion: 3\n    m_TransformParent: {{fileID: 101}}\n    m_Modifications:\n    - target: {{fileID: 100000, guid: {GUID}, type: 3}}\n      propertyPath: m_Name\n      value: Renamed Turret\n      objectReference: {{fileID: 0}}\n    - target: {{fileID: 400000, guid: {GUID}, type: 3}}\n      propertyPath: m_LocalPosition.x\n      value: 4\n      objectReference: {{fileID: 0}}\n    m_RemovedComponents: []\n    m_RemovedGameObjects: []\n    m_AddedGameObjects: []\n    m_AddedComponents: []\n  m_SourcePrefab: {{fileID: 100100000, guid: {GUID}, type: 3}}\n\
--- !u!1 &500 stripped\nGameObject:\n  m_CorrespondingSourceObject: {{fileID: 100000, guid: {GUID}, type: 3}}\n  m_PrefabInstance: {{fileID: 700}}\n  m_PrefabAsset: {{fileID: 0}}\n\
--- !u!4 &501 stripped\nTransform:\n  m_CorrespondingSourceObject: {{fileID: 400000, guid: {GUID}, type: 3}}\n  m_PrefabInstance: {{fileID: 700}}\n  m_PrefabAsset: {{fileID: 0}}\n"
        )
    }

    #[test]
    fn test_unpack_applies_overrides_and_reparents() {
        let dir = tempfile::tempdir().unwrap();
        let prefab_path = dir.path().join("Turret.prefab");
        std::fs::write(&prefab_path, source_prefab()).unwrap();
        let scene_path = dir.path().join("Scene.unity").to_string_lossy().into_owned();
        std::fs::write(&scene_path, host_scene()).unwrap();

        let resolver = FixedResolver {
            guid: GUID.to_string(),
            path: prefab_path,
        };
        let report = unpack_prefab_instance(&scene_path, "700", None, &resolver).unwrap();
        assert_eq!(report.unpacked_count, 3);
        assert!(report.warnings.is_empty());

        let doc = Document::from_file(&scene_path, true).unwrap();
        // instance and handles are gone
        assert!(doc.find_by_file_id("700").is_none());
        assert!(doc.find_by_file_id("500").is_none());
        assert!(doc.find_by_file_id("501").is_none());

        // the unpacked root carries the m_Name override and sits under Host
        let go = doc.find_by_file_id(&report.new_root_go_id).unwrap();
        assert_eq!(go.get_property("m_Name").unwrap(), "Renamed Turret");
        let tf_id = doc.transform_of_game_object(&report.new_root_go_id).unwrap();
        assert_eq!(doc.parent_of(&tf_id).unwrap(), "101");
        assert_eq!(doc.children_of("101"), vec![tf_id.clone()]);

        // the transform override landed too, format preserved
        let tf = doc.find_by_file_id(&tf_id).unwrap();
        assert_eq!(tf.get_property("m_LocalPosition").unwrap(), "{x: 4, y: 0, z: 0}");

        // all ids are fresh and unique
        let all = doc.all_file_ids();
        let unique: HashSet<&String> = all.iter().collect();
        assert_eq!(all.len(), unique.len());
        assert!(!all.contains(&"100000".to_string()));
    }

    #[test]
    fn test_unpack_skips_removed_components() {
        let dir = tempfile::tempdir().unwrap();
        let prefab_path = dir.path().join("Turret.prefab");
        std::fs::write(&prefab_path, source_prefab()).unwrap();
        let scene_path = dir.path().join("Scene.unity").to_string_lossy().into_owned();
        let scene = host_scene().replace(
            "    m_RemovedComponents: []",
            &format!(
                "    m_RemovedComponents:\n    - {{fileID: 6500000, guid: {GUID}, type: 3}}"
            ),
        );
        std::fs::write(&scene_path, scene).unwrap();

        let resolver = FixedResolver {
            guid: GUID.to_string(),
            path: prefab_path,
        };
        let report = unpack_prefab_instance(&scene_path, "700", None, &resolver).unwrap();
        assert_eq!(report.unpacked_count, 2);
        let doc = Document::from_file(&scene_path, true).unwrap();
        assert!(doc.find_by_class_id(65).is_empty());
    }

    #[test]
    fn test_unpack_unresolvable_guid_fails_with_hint() {
        let dir = tempfile::tempdir().unwrap();
        let scene_path = dir.path().join("Scene.unity").to_string_lossy().into_owned();
        std::fs::write(&scene_path, host_scene()).unwrap();
        let resolver = FixedResolver {
            guid: "ffffffffffffffffffffffffffffffff".to_string(),
            path: PathBuf::from("/nope"),
        };
        let err = unpack_prefab_instance(&scene_path, "700", None, &resolver).unwrap_err();
        assert!(err.to_string().contains("GUID cache"));
    }
}
