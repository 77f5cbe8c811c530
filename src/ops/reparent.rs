//! Reparenting: move a Transform under a new parent (or to the scene root)
//! while keeping parent/child symmetry and sibling order intact.

use tracing::debug;

use crate::common::{EngineError, ReparentReport, Result};
use crate::document::Document;
use crate::validate::{validate_file_path, PathMode};

/// Move `child` under `new_parent` (`"root"` detaches to the scene root).
/// Self-parenting and cycles are refused before anything is touched.
pub fn reparent(file: &str, child: &str, new_parent: &str) -> Result<ReparentReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;

    let child_tf = doc.require_unique_transform(child)?;
    let new_parent_tf = if new_parent == "root" {
        "0".to_string()
    } else {
        doc.require_unique_transform(new_parent)?
    };

    if child_tf == new_parent_tf {
        return Err(EngineError::policy(format!(
            "cannot parent Transform {child_tf} under itself"
        )));
    }
    // walk the new parent's ancestry; meeting the child means a cycle
    let mut cursor = new_parent_tf.clone();
    while cursor != "0" {
        if cursor == child_tf {
            return Err(EngineError::CircularHierarchy {
                child: child_tf,
                ancestor: new_parent_tf,
            });
        }
        cursor = match doc.parent_of(&cursor) {
            Some(parent) => parent,
            None => break,
        };
    }

    let old_parent = doc.parent_of(&child_tf).unwrap_or_else(|| "0".to_string());
    if old_parent != "0" {
        doc.remove_child_from_parent(&old_parent, &child_tf)?;
    }

    {
        let block = doc
            .find_by_file_id_mut(&child_tf)
            .ok_or_else(|| EngineError::not_found("Transform", child_tf.clone()))?;
        block.set_property("m_Father", &format!("{{fileID: {new_parent_tf}}}"))?;
    }

    // with the father already rewritten, a root count includes the child
    let root_order = if new_parent_tf == "0" {
        doc.calculate_root_order("0").saturating_sub(1)
    } else {
        doc.calculate_root_order(&new_parent_tf)
    };
    {
        let block = doc
            .find_by_file_id_mut(&child_tf)
            .ok_or_else(|| EngineError::not_found("Transform", child_tf.clone()))?;
        block.set_property("m_RootOrder", &root_order.to_string())?;
    }

    if new_parent_tf != "0" {
        doc.add_child_to_parent(&new_parent_tf, &child_tf)?;
    }

    doc.validate()?;
    doc.save(None)?;
    debug!(file, %child_tf, %old_parent, %new_parent_tf, "reparented");
    Ok(ReparentReport {
        old_parent_id: old_parent,
        new_parent_id: new_parent_tf,
    })
}
