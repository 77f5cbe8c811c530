//! Subtree duplication: clone a GameObject, its components, and all
//! descendants under fresh file ids.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::common::{random_file_id, ClonedObject, DuplicateReport, EngineError, Result};
use crate::document::{Block, Document};
use crate::validate::{validate_file_path, validate_name, PathMode};

/// Duplicate a GameObject subtree. The clone lands under the original's
/// parent with a fresh sibling index; its root is renamed to `new_name` or
/// `"<original> (1)"`.
pub fn duplicate_game_object(
    file: &str,
    go: &str,
    new_name: Option<&str>,
) -> Result<DuplicateReport> {
    validate_file_path(file, PathMode::Write)?;
    if let Some(n) = new_name {
        validate_name(n, "new name")?;
    }
    let mut doc = Document::from_file(file, true)?;
    let go_id = doc.require_unique_game_object(go)?;

    let original_name = doc
        .find_by_file_id(&go_id)
        .and_then(|b| b.get_property("m_Name"))
        .unwrap_or_default();
    let transform_id = doc.transform_of_game_object(&go_id)?;
    let father = doc
        .parent_of(&transform_id)
        .unwrap_or_else(|| "0".to_string());

    // ordered closure: the object itself, its components, then descendants
    let mut closure: Vec<String> = vec![go_id.clone()];
    closure.extend(doc.component_ids_of(&go_id));
    closure.extend(doc.collect_hierarchy(&transform_id));

    let mut map: HashMap<String, String> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    for old in &closure {
        let new = loop {
            let id = random_file_id();
            if id != "0" && !doc.contains_file_id(&id) && taken.insert(id.clone()) {
                break id;
            }
        };
        map.insert(old.clone(), new);
    }

    let mut clones: Vec<Block> = Vec::with_capacity(closure.len());
    for old in &closure {
        let source = doc
            .find_by_file_id(old)
            .ok_or_else(|| EngineError::not_found("block", old.clone()))?;
        let mut clone = source.clone();
        for (from, to) in &map {
            clone.remap_file_id(from, to);
        }
        clones.push(clone);
    }

    let final_name = match new_name {
        Some(n) => n.to_string(),
        None => format!("{original_name} (1)"),
    };
    let new_go_id = map[&go_id].clone();
    let new_transform_id = map[&transform_id].clone();
    if let Some(root_clone) = clones.iter_mut().find(|b| b.file_id() == new_go_id) {
        root_clone.set_property("m_Name", &final_name)?;
    }
    let root_order = doc.calculate_root_order(&father);
    if let Some(tf_clone) = clones.iter_mut().find(|b| b.file_id() == new_transform_id) {
        tf_clone.set_property("m_RootOrder", &root_order.to_string())?;
    }

    let cloned_objects: Vec<ClonedObject> = closure
        .iter()
        .map(|old| ClonedObject {
            old_id: old.clone(),
            new_id: map[old].clone(),
        })
        .collect();
    let total = clones.len();
    for clone in clones {
        doc.append_block(clone);
    }
    if father != "0" {
        doc.add_child_to_parent(&father, &new_transform_id)?;
    }

    let mut warnings = Vec::new();
    let exact_clone_collisions = doc.find_game_objects_by_name(&final_name);
    if exact_clone_collisions.len() > 1 {
        let ids: Vec<String> = exact_clone_collisions
            .iter()
            .map(|b| b.file_id().to_string())
            .collect();
        warnings.push(format!(
            "'{final_name}' now appears {} times (fileIDs: {})",
            ids.len(),
            ids.join(", ")
        ));
    } else if final_name != original_name && !original_name.is_empty() {
        let originals = doc.find_game_objects_by_name(&original_name);
        if originals.len() > 1 {
            let mut ids: Vec<String> =
                originals.iter().map(|b| b.file_id().to_string()).collect();
            ids.push(new_go_id.clone());
            warnings.push(format!(
                "'{original_name}' now appears {} times (fileIDs: {})",
                ids.len(),
                ids.join(", ")
            ));
        }
    }
    for w in &warnings {
        warn!(file, warning = %w, "duplicate produced a name collision");
    }

    doc.validate()?;
    doc.save(None)?;
    debug!(file, %go_id, %new_go_id, total, "duplicated GameObject subtree");
    Ok(DuplicateReport {
        new_go_id,
        new_transform_id,
        total_duplicated: total,
        cloned_objects,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::component::add_component;
    use crate::ops::create::{create_game_object, create_scene};

    fn fresh_scene(dir: &tempfile::TempDir) -> String {
        let path = dir.path().join("S.unity").to_string_lossy().into_owned();
        create_scene(&path, false, None).unwrap();
        path
    }

    #[test]
    fn test_duplicate_simple_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = fresh_scene(&dir);
        create_game_object(&path, "Crate", None).unwrap();
        add_component(&path, "Crate", "BoxCollider", None, None, None).unwrap();

        let report = duplicate_game_object(&path, "Crate", None).unwrap();
        assert_eq!(report.total_duplicated, 3);
        assert!(report.warnings.is_empty());

        let doc = Document::from_file(&path, true).unwrap();
        let clone_id = doc.require_unique_game_object("Crate (1)").unwrap();
        assert_eq!(clone_id, report.new_go_id);
        assert_eq!(doc.component_ids_of(&clone_id).len(), 2);
        // fresh ids everywhere
        let all = doc.all_file_ids();
        let unique: std::collections::HashSet<&String> = all.iter().collect();
        assert_eq!(all.len(), unique.len());
    }

    #[test]
    fn test_duplicate_subtree_remaps_internal_refs() {
        let dir = tempfile::tempdir().unwrap();
        let path = fresh_scene(&dir);
        create_game_object(&path, "Parent", None).unwrap();
        create_game_object(&path, "Child", Some("Parent")).unwrap();

        let report = duplicate_game_object(&path, "Parent", Some("ParentCopy")).unwrap();
        assert_eq!(report.total_duplicated, 4);

        let doc = Document::from_file(&path, true).unwrap();
        let copy_go = doc.require_unique_game_object("ParentCopy").unwrap();
        let copy_tf = doc.transform_of_game_object(&copy_go).unwrap();
        let copy_children = doc.children_of(&copy_tf);
        assert_eq!(copy_children.len(), 1);
        // the cloned child points back at the cloned parent, not the original
        assert_eq!(doc.parent_of(&copy_children[0]).unwrap(), copy_tf);
        let orig_tf = doc.require_unique_transform("Parent").unwrap();
        assert_ne!(copy_children[0], doc.children_of(&orig_tf)[0]);
    }

    #[test]
    fn test_duplicate_root_order_and_parent_registration() {
        let dir = tempfile::tempdir().unwrap();
        let path = fresh_scene(&dir);
        create_game_object(&path, "Holder", None).unwrap();
        create_game_object(&path, "Item", Some("Holder")).unwrap();

        let report = duplicate_game_object(&path, "Item", Some("Item2")).unwrap();
        let doc = Document::from_file(&path, true).unwrap();
        let holder_tf = doc.require_unique_transform("Holder").unwrap();
        assert_eq!(doc.children_of(&holder_tf).len(), 2);
        let clone_tf = doc.find_by_file_id(&report.new_transform_id).unwrap();
        assert_eq!(clone_tf.get_property("m_RootOrder").unwrap(), "1");
        assert_eq!(doc.parent_of(&report.new_transform_id).unwrap(), holder_tf);
    }

    #[test]
    fn test_duplicate_ambiguous_name_lists_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = fresh_scene(&dir);
        let a = create_game_object(&path, "Enemy", None).unwrap();
        let b = create_game_object(&path, "Enemy", None).unwrap();

        let err = duplicate_game_object(&path, "Enemy", None).unwrap_err();
        match err {
            EngineError::AmbiguousName { candidates, .. } => {
                assert!(candidates.contains(&a.go_id));
                assert!(candidates.contains(&b.go_id));
            }
            other => panic!("expected AmbiguousName, got {other:?}"),
        }

        // retried with the unique file id it succeeds and warns about the
        // name family
        let report = duplicate_game_object(&path, &a.go_id, None).unwrap();
        let doc = Document::from_file(&path, true).unwrap();
        assert!(doc.require_unique_game_object("Enemy (1)").is_ok());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("'Enemy' now appears 3 times"));
        assert!(report.warnings[0].contains(&a.go_id));
        assert!(report.warnings[0].contains(&b.go_id));
        assert!(report.warnings[0].contains(&report.new_go_id));
    }

    #[test]
    fn test_duplicate_exact_name_collision_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = fresh_scene(&dir);
        create_game_object(&path, "A", None).unwrap();
        create_game_object(&path, "B", None).unwrap();
        let report = duplicate_game_object(&path, "A", Some("B")).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("'B' now appears 2 times"));
    }
}
