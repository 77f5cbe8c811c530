//! Component attachment, cloning between GameObjects, and removal.

use std::path::Path;

use tracing::warn;

use crate::classes;
use crate::common::{
    AddComponentReport, CopyComponentReport, EngineError, RemoveComponentReport, Result,
};
use crate::defaults::emit_field_defaults;
use crate::document::Document;
use crate::ops::templates;
use crate::resolve::{ProjectSettingsSource, ScriptResolver};
use crate::validate::{validate_file_path, validate_guid, PathMode};

const ALLOWED_BEHAVIOUR_BASES: &[&str] =
    &["MonoBehaviour", "NetworkBehaviour", "StateMachineBehaviour"];

/// Attach a component to a GameObject. Built-in component names come from
/// the class registry; anything else resolves through the caller's type
/// registry as a custom script.
pub fn add_component(
    file: &str,
    go: &str,
    component: &str,
    project_path: Option<&Path>,
    resolver: Option<&dyn ScriptResolver>,
    settings: Option<&dyn ProjectSettingsSource>,
) -> Result<AddComponentReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    let go_id = doc.require_unique_game_object(go)?;

    if let Some(class_id) = classes::class_id_of(component) {
        return add_builtin_component(&mut doc, &go_id, component, class_id);
    }
    add_script_component(&mut doc, &go_id, component, project_path, resolver, settings)
}

fn add_builtin_component(
    doc: &mut Document,
    go_id: &str,
    component: &str,
    class_id: u32,
) -> Result<AddComponentReport> {
    let body = classes::default_component_body(class_id, go_id).ok_or_else(|| {
        EngineError::policy(format!(
            "built-in class '{component}' cannot be attached as a component"
        ))
    })?;

    let warning = duplicate_class_warning(doc, go_id, class_id, component);
    let component_id = doc.generate_file_id();
    doc.append_raw(&format!("--- !u!{class_id} &{component_id}\n{body}"))?;
    register_component(doc, go_id, &component_id)?;
    doc.validate()?;
    doc.save(None)?;
    Ok(AddComponentReport {
        component_id,
        class_id,
        script_guid: None,
        warning,
    })
}

fn add_script_component(
    doc: &mut Document,
    go_id: &str,
    script: &str,
    project_path: Option<&Path>,
    resolver: Option<&dyn ScriptResolver>,
    settings: Option<&dyn ProjectSettingsSource>,
) -> Result<AddComponentReport> {
    let resolver = resolver.ok_or_else(|| EngineError::Unavailable {
        what: "type registry".to_string(),
        hint: "run setup to build the GUID cache, or pass a script resolver".to_string(),
    })?;
    let info = resolver.resolve_script(script, project_path).ok_or_else(|| {
        EngineError::not_found_hint(
            "script",
            script,
            "not in the type registry; run setup to build the GUID cache",
        )
    })?;
    validate_guid(&info.guid)?;
    if matches!(info.kind.as_deref(), Some("enum") | Some("interface")) {
        return Err(EngineError::policy(format!(
            "'{script}' is an {}; only classes can be attached",
            info.kind.as_deref().unwrap_or("enum")
        )));
    }
    if let Some(base) = info.base_class.as_deref() {
        if !ALLOWED_BEHAVIOUR_BASES.contains(&base) {
            return Err(EngineError::policy(format!(
                "'{script}' derives from {base}, expected one of {}",
                ALLOWED_BEHAVIOUR_BASES.join(", ")
            )));
        }
    }

    let version = match (project_path, settings) {
        (Some(p), Some(s)) => s.unity_version(p),
        _ => None,
    };
    let (field_defaults, mut warnings) = match &info.fields {
        Some(fields) => emit_field_defaults(fields, version.as_ref()),
        None => (String::new(), Vec::new()),
    };

    // same script already present on this object?
    let already = doc.component_ids_of(go_id).iter().any(|id| {
        doc.find_by_file_id(id)
            .filter(|b| classes::is_script_container(b.class_id()))
            .map(|b| b.raw().contains(&format!("guid: {}", info.guid)))
            .unwrap_or(false)
    });
    if already {
        warnings.push(format!("GameObject {go_id} already has a '{script}' component"));
    }

    let component_id = doc.generate_file_id();
    doc.append_raw(&templates::mono_behaviour_block(
        &component_id,
        go_id,
        &info.guid,
        &field_defaults,
    ))?;
    register_component(doc, go_id, &component_id)?;
    doc.validate()?;
    doc.save(None)?;
    if !warnings.is_empty() {
        warn!(go_id, script, warnings = ?warnings, "component added with warnings");
    }
    Ok(AddComponentReport {
        component_id,
        class_id: classes::MONO_BEHAVIOUR,
        script_guid: Some(info.guid),
        warning: if warnings.is_empty() {
            None
        } else {
            Some(warnings.join("; "))
        },
    })
}

fn duplicate_class_warning(
    doc: &Document,
    go_id: &str,
    class_id: u32,
    component: &str,
) -> Option<String> {
    let exists = doc
        .component_ids_of(go_id)
        .iter()
        .filter_map(|id| doc.find_by_file_id(id))
        .any(|b| b.class_id() == class_id);
    if exists {
        warn!(go_id, component, "GameObject already has a component of this class");
        Some(format!(
            "GameObject {go_id} already has a {component} component"
        ))
    } else {
        None
    }
}

fn register_component(doc: &mut Document, go_id: &str, component_id: &str) -> Result<()> {
    let go = doc
        .find_by_file_id_mut(go_id)
        .ok_or_else(|| EngineError::not_found("GameObject", go_id))?;
    go.insert_array_element(
        "m_Component",
        -1,
        &format!("component: {{fileID: {component_id}}}"),
    )
}

/// Clone an existing component block onto another GameObject. GameObjects
/// and Transforms cannot travel through this path.
pub fn copy_component(file: &str, source_id: &str, target_go: &str) -> Result<CopyComponentReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    let source = doc
        .find_by_file_id(source_id)
        .ok_or_else(|| EngineError::not_found("component", source_id))?;
    let class_id = source.class_id();
    if class_id == classes::GAME_OBJECT {
        return Err(EngineError::policy(
            "cannot copy a GameObject as a component; use duplicate instead",
        ));
    }
    if classes::is_hierarchy_provider(class_id) {
        return Err(EngineError::policy(
            "Transforms cannot be copied; every GameObject already owns one",
        ));
    }
    let target_id = doc.require_unique_game_object(target_go)?;

    let new_id = doc.generate_file_id();
    let mut clone = doc
        .find_by_file_id(source_id)
        .ok_or_else(|| EngineError::not_found("component", source_id))?
        .clone();
    clone.remap_file_id(source_id, &new_id);
    clone.set_property("m_GameObject", &format!("{{fileID: {target_id}}}"))?;
    doc.append_block(clone);
    register_component(&mut doc, &target_id, &new_id)?;
    doc.validate()?;
    doc.save(None)?;
    Ok(CopyComponentReport {
        new_component_id: new_id,
        class_id,
    })
}

/// Detach and delete one component by file id. Refuses GameObjects and
/// Transforms.
pub fn remove_component(file: &str, file_id: &str) -> Result<RemoveComponentReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    let block = doc
        .find_by_file_id(file_id)
        .ok_or_else(|| EngineError::not_found("component", file_id))?;
    let class_id = block.class_id();
    if class_id == classes::GAME_OBJECT {
        return Err(EngineError::policy(
            "fileID names a GameObject; use delete GameObject instead",
        ));
    }
    if classes::is_hierarchy_provider(class_id) {
        return Err(EngineError::policy(
            "the Transform cannot be removed from a GameObject",
        ));
    }

    if let Some(go_id) = doc.game_object_of(file_id) {
        let needle = format!("{{fileID: {file_id}}}");
        if let Some(go) = doc.find_by_file_id_mut(&go_id) {
            let elements = go.array_elements("m_Component");
            match elements.iter().position(|e| e.contains(&needle)) {
                Some(idx) => go.remove_array_element("m_Component", idx)?,
                None => warn!(%go_id, file_id, "component not listed in m_Component"),
            }
        }
    }

    doc.remove_block(file_id)?;
    doc.validate()?;
    doc.save(None)?;
    Ok(RemoveComponentReport {
        removed_class_id: class_id,
    })
}
