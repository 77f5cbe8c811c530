//! Destructive operations: delete a GameObject subtree or a whole
//! PrefabInstance, keeping the surviving hierarchy consistent.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::classes;
use crate::common::{DeleteReport, EngineError, Result};
use crate::document::Document;
use crate::ops::resolve_prefab_instance;
use crate::validate::{validate_file_path, PathMode};

static TRANSFORM_PARENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"m_TransformParent: \{fileID: (-?\d+)\}").expect("Invalid regex")
});

static ADDED_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"addedObject: \{fileID: (-?\d+)\}").expect("Invalid regex"));

/// Delete a GameObject, its components, and every descendant.
pub fn delete_game_object(file: &str, go: &str) -> Result<DeleteReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    let go_id = doc.require_unique_game_object(go)?;

    let components = doc.component_ids_of(&go_id);
    let transform = components
        .iter()
        .find(|id| {
            doc.find_by_file_id(id)
                .map(|b| classes::is_hierarchy_provider(b.class_id()))
                .unwrap_or(false)
        })
        .cloned();

    let mut closure: HashSet<String> = HashSet::new();
    closure.insert(go_id.clone());
    closure.extend(components.iter().cloned());
    if let Some(tf) = &transform {
        closure.extend(doc.collect_hierarchy(tf));
        if let Some(father) = doc.parent_of(tf) {
            if father != "0" && !closure.contains(&father) {
                doc.remove_child_from_parent(&father, tf)?;
            }
        }
    }

    let deleted = doc.remove_blocks(&closure);
    doc.validate()?;
    doc.save(None)?;
    debug!(file, %go_id, deleted, "deleted GameObject subtree");
    Ok(DeleteReport {
        deleted_count: deleted,
    })
}

/// Delete a PrefabInstance: the instance block, its stripped handles, and
/// everything added on top of the instance.
pub fn delete_prefab_instance(file: &str, pi: &str) -> Result<DeleteReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    let pi_id = resolve_prefab_instance(&doc, pi)?;

    let pi_block = doc
        .find_by_file_id(&pi_id)
        .ok_or_else(|| EngineError::not_found("PrefabInstance", pi_id.clone()))?;
    let parent_tf = TRANSFORM_PARENT_RE
        .captures(pi_block.raw())
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "0".to_string());
    let added_gos: Vec<String> = pi_block
        .array_elements("m_AddedGameObjects")
        .iter()
        .filter_map(|e| ADDED_OBJECT_RE.captures(e).map(|c| c[1].to_string()))
        .collect();
    let added_components: Vec<String> = pi_block
        .array_elements("m_AddedComponents")
        .iter()
        .filter_map(|e| ADDED_OBJECT_RE.captures(e).map(|c| c[1].to_string()))
        .collect();

    let mut closure: HashSet<String> = HashSet::new();
    closure.insert(pi_id.clone());
    closure.extend(added_components);

    let pi_ref = format!("m_PrefabInstance: {{fileID: {pi_id}}}");
    let stripped: Vec<(String, u32)> = doc
        .blocks()
        .iter()
        .filter(|b| b.is_stripped() && b.raw().contains(&pi_ref))
        .map(|b| (b.file_id().to_string(), b.class_id()))
        .collect();
    closure.extend(stripped.iter().map(|(id, _)| id.clone()));

    for go_id in &added_gos {
        closure.insert(go_id.clone());
        let components = doc.component_ids_of(go_id);
        closure.extend(components.iter().cloned());
        if let Some(tf) = components.first() {
            closure.extend(doc.collect_hierarchy(tf));
        }
    }

    // detach the instance's stripped Transforms from the host parent
    if parent_tf != "0" {
        let children = doc.children_of(&parent_tf);
        for (id, class_id) in &stripped {
            if classes::is_hierarchy_provider(*class_id) && children.contains(id) {
                doc.remove_child_from_parent(&parent_tf, id)?;
            }
        }
    }

    let deleted = doc.remove_blocks(&closure);
    doc.validate()?;
    doc.save(None)?;
    debug!(file, %pi_id, deleted, "deleted PrefabInstance");
    Ok(DeleteReport {
        deleted_count: deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::create::{create_game_object, create_scene};

    #[test]
    fn test_create_and_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.unity").to_string_lossy().into_owned();
        create_scene(&path, false, None).unwrap();
        let baseline = std::fs::read_to_string(&path).unwrap();

        create_game_object(&path, "A", None).unwrap();
        let report = delete_game_object(&path, "A").unwrap();
        assert_eq!(report.deleted_count, 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), baseline);
    }

    #[test]
    fn test_delete_subtree_and_parent_children() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("S.unity").to_string_lossy().into_owned();
        create_scene(&path, false, None).unwrap();
        create_game_object(&path, "Root", None).unwrap();
        create_game_object(&path, "Mid", Some("Root")).unwrap();
        create_game_object(&path, "Leaf", Some("Mid")).unwrap();

        let report = delete_game_object(&path, "Mid").unwrap();
        // Mid + its Transform + Leaf + Leaf's Transform
        assert_eq!(report.deleted_count, 4);
        let doc = Document::from_file(&path, true).unwrap();
        assert!(doc.find_game_objects_by_name("Mid").is_empty());
        assert!(doc.find_game_objects_by_name("Leaf").is_empty());
        let root_tf = doc.require_unique_transform("Root").unwrap();
        assert!(doc.children_of(&root_tf).is_empty());
        assert!(doc
            .find_by_file_id(&root_tf)
            .unwrap()
            .raw()
            .contains("m_Children: []"));
    }

    #[test]
    fn test_delete_by_ambiguous_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("S.unity").to_string_lossy().into_owned();
        create_scene(&path, false, None).unwrap();
        create_game_object(&path, "Enemy", None).unwrap();
        create_game_object(&path, "Enemy", None).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();
        assert!(matches!(
            delete_game_object(&path, "Enemy"),
            Err(EngineError::AmbiguousName { .. })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    const SCENE_WITH_PI: &str = "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n\
--- !u!1 &100\nGameObject:\n  m_ObjectHideFlags: 0\n  serializedVersion: 6\n  m_Component:\n  - component: {fileID: 101}\n  m_Layer: 0\n  m_Name: Host\n  m_TagString: Untagged\n  m_Icon: {fileID: 0}\n  m_NavMeshLayer: 0\n  m_StaticEditorFlags: 0\n  m_IsActive: 1\n\
--- !u!4 &101\nTransform:\n  m_ObjectHideFlags: 0\n  m_GameObject: {fileID: 100}\n  m_LocalRotation: {x: 0, y: 0, z: 0, w: 1}\n  m_LocalPosition: {x: 0, y: 0, z: 0}\n  m_LocalScale: {x: 1, y: 1, z: 1}\n  m_Children:\n  - {fileID: 501}\n  m_Father: {fileID: 0}\n  m_RootOrder: 0\n  m_LocalEulerAnglesHint: {x: 0, y: 0, z: 0}\n\
--- !u!1001 &700\nPrefabInstance:\n  m_ObjectHideFlags: 0\n  serializedVersion: 2\n  m_Modification:\n    serializedVersion: 3\n    m_TransformParent: {fileID: 101}\n    m_Modifications:\n    - target: {fileID: 100000, guid: a1b2c3d4e5f6789012345678abcdef12, type: 3}\n      propertyPath: m_Name\n      value: Turret\n      objectReference: {fileID: 0}\n    m_RemovedComponents: []\n    m_RemovedGameObjects: []\n    m_AddedGameObjects: []\n    m_AddedComponents: []\n  m_SourcePrefab: {fileID: 100100000, guid: a1b2c3d4e5f6789012345678abcdef12, type: 3}\n\
--- !u!1 &500 stripped\nGameObject:\n  m_CorrespondingSourceObject: {fileID: 100000, guid: a1b2c3d4e5f6789012345678abcdef12, type: 3}\n  m_PrefabInstance: {fileID: 700}\n  m_PrefabAsset: {fileID: 0}\n\
--- !u!4 &501 stripped\nTransform:\n  m_CorrespondingSourceObject: {fileID: 400000, guid: a1b2c3d4e5f6789012345678abcdef12, type: 3}\n  m_PrefabInstance: {fileID: 700}\n  m_PrefabAsset: {fileID: 0}\n";

    #[test]
    fn test_delete_prefab_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("P.unity").to_string_lossy().into_owned();
        std::fs::write(&path, SCENE_WITH_PI).unwrap();

        let report = delete_prefab_instance(&path, "700").unwrap();
        assert_eq!(report.deleted_count, 3);
        let doc = Document::from_file(&path, true).unwrap();
        assert!(doc.find_by_file_id("700").is_none());
        assert!(doc.find_by_file_id("500").is_none());
        assert!(doc.find_by_file_id("501").is_none());
        // host parent no longer lists the stripped child
        assert!(doc.children_of("101").is_empty());
        assert!(doc
            .find_by_file_id("101")
            .unwrap()
            .raw()
            .contains("m_Children: []"));
    }

    #[test]
    fn test_delete_prefab_instance_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("P.unity").to_string_lossy().into_owned();
        std::fs::write(&path, SCENE_WITH_PI).unwrap();
        let report = delete_prefab_instance(&path, "Turret").unwrap();
        assert_eq!(report.deleted_count, 3);
    }
}
