//! Property-editing operations: GameObject flags, arbitrary component
//! fields with type discipline, Transform placement, and batched edits that
//! load and save the document exactly once.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::common::{
    BatchEditReport, EditComponentReport, EditReport, EngineError, Result,
};
use crate::document::{Document, ValueShape};
use crate::resolve::ProjectSettingsSource;
use crate::validate::{validate_file_path, validate_name, validate_vector3, PathMode};

static REFERENCE_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{fileID: (-?\d+)(?:, guid: [0-9a-f]{32}, type: \d+)?\}$").expect("Invalid regex")
});

/// GameObject flags the engine will edit by name.
const GO_PROPERTIES: &[&str] = &[
    "Name",
    "TagString",
    "IsActive",
    "Layer",
    "StaticEditorFlags",
    "Icon",
    "NavMeshLayer",
];

const BUILTIN_TAGS: &[&str] = &[
    "Untagged",
    "Respawn",
    "Finish",
    "EditorOnly",
    "MainCamera",
    "Player",
    "GameController",
];

/// Edit one of the closed set of GameObject flags, inserting the line when
/// Unity left it out of the serialization.
pub fn edit_game_object_property(
    file: &str,
    go: &str,
    property: &str,
    value: &str,
    project_path: Option<&Path>,
    settings: Option<&dyn ProjectSettingsSource>,
) -> Result<EditReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    let bytes = apply_game_object_edit(&mut doc, go, property, value, project_path, settings)?;
    doc.validate()?;
    let written = doc.save(None)?;
    debug!(file, go, property, bytes, "edited GameObject property");
    Ok(EditReport {
        file: file.to_string(),
        bytes_written: written,
    })
}

fn apply_game_object_edit(
    doc: &mut Document,
    go: &str,
    property: &str,
    value: &str,
    project_path: Option<&Path>,
    settings: Option<&dyn ProjectSettingsSource>,
) -> Result<u64> {
    let prop = property.strip_prefix("m_").unwrap_or(property);
    if !GO_PROPERTIES.contains(&prop) {
        return Err(EngineError::policy(format!(
            "'{property}' is not an editable GameObject property (expected one of {})",
            GO_PROPERTIES.join(", ")
        )));
    }
    let normalized = match prop {
        "Name" => {
            validate_name(value, "GameObject name")?;
            value.to_string()
        }
        "IsActive" => match value {
            "0" | "false" => "0".to_string(),
            "1" | "true" => "1".to_string(),
            _ => {
                return Err(EngineError::type_mismatch(
                    property,
                    format!("IsActive accepts 0, 1, true or false, got '{value}'"),
                ))
            }
        },
        "Layer" => {
            let layer: i64 = value.parse().map_err(|_| {
                EngineError::type_mismatch(property, format!("'{value}' is not an integer"))
            })?;
            if !(0..=31).contains(&layer) {
                return Err(EngineError::type_mismatch(
                    property,
                    format!("layer {layer} is outside 0..=31"),
                ));
            }
            value.to_string()
        }
        "StaticEditorFlags" | "NavMeshLayer" => {
            let flags: i64 = value.parse().map_err(|_| {
                EngineError::type_mismatch(property, format!("'{value}' is not an integer"))
            })?;
            if flags < 0 {
                return Err(EngineError::type_mismatch(
                    property,
                    format!("{prop} must be non-negative, got {flags}"),
                ));
            }
            value.to_string()
        }
        "TagString" => {
            if !BUILTIN_TAGS.contains(&value) {
                match (project_path, settings) {
                    (Some(p), Some(s)) => {
                        let known = s.tags(p).unwrap_or_default();
                        if !known.iter().any(|t| t == value) {
                            return Err(EngineError::policy(format!(
                                "tag '{value}' is neither built-in nor declared in the TagManager"
                            )));
                        }
                    }
                    // without a project there is nothing to check against
                    _ => {}
                }
            }
            value.to_string()
        }
        _ => value.to_string(),
    };

    let go_id = doc.require_unique_game_object(go)?;
    let block = doc
        .find_by_file_id_mut(&go_id)
        .ok_or_else(|| EngineError::not_found("GameObject", go_id.clone()))?;
    block.set_or_insert_property(&format!("m_{prop}"), &normalized)?;
    Ok(block.raw().len() as u64)
}

/// Edit any component property by file id. The property is looked up by the
/// exact name first, then with an `m_` prefix; the incoming value must match
/// the shape of the current serialized value.
pub fn edit_component_by_file_id(
    file: &str,
    file_id: &str,
    property: &str,
    value: &str,
) -> Result<EditComponentReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    let class_id = apply_component_edit(&mut doc, file_id, property, value)?;
    doc.validate()?;
    let written = doc.save(None)?;
    Ok(EditComponentReport {
        class_id,
        bytes_written: written,
    })
}

fn apply_component_edit(
    doc: &mut Document,
    file_id: &str,
    property: &str,
    value: &str,
) -> Result<u32> {
    let block = doc
        .find_by_file_id(file_id)
        .ok_or_else(|| EngineError::not_found("component", file_id))?;
    if block.is_stripped() {
        return Err(EngineError::policy(format!(
            "fileID {file_id} is a stripped prefab handle; edit the PrefabInstance override instead"
        )));
    }
    let class_id = block.class_id();

    let candidates = candidate_property_names(property);
    let mut chosen: Option<(String, ValueShape)> = None;
    for candidate in &candidates {
        if let Some(shape) = block.property_shape(candidate) {
            chosen = Some((candidate.clone(), shape));
            break;
        }
    }
    let (name, shape) = chosen.ok_or_else(|| {
        EngineError::not_found_hint(
            "property",
            format!("{property} on fileID {file_id}"),
            "Unity serializes only non-default values; set the property in the editor once, then retry",
        )
    })?;

    check_value_shape(&name, shape, value)?;
    if shape == ValueShape::Reference {
        if let Some(caps) = REFERENCE_VALUE_RE.captures(value) {
            let target = &caps[1];
            let external = value.contains("guid:");
            if !external && target != "0" && !doc.contains_file_id(target) {
                return Err(EngineError::not_found_hint(
                    "referenced fileID",
                    target,
                    "the reference must point at a block in the same file, or be {fileID: 0}",
                ));
            }
        }
    }

    let block = doc
        .find_by_file_id_mut(file_id)
        .ok_or_else(|| EngineError::not_found("component", file_id))?;
    block.set_property(&name, value)?;
    Ok(class_id)
}

/// One ordered fallback for property lookup: the exact name, then the
/// `m_`-prefixed variant of the first path segment.
fn candidate_property_names(property: &str) -> Vec<String> {
    let mut names = vec![property.to_string()];
    let first = property.split('.').next().unwrap_or(property);
    if !first.starts_with("m_") {
        names.push(format!("m_{property}"));
    }
    names
}

fn check_value_shape(name: &str, shape: ValueShape, value: &str) -> Result<()> {
    match shape {
        ValueShape::Reference => {
            if !REFERENCE_VALUE_RE.is_match(value) {
                return Err(EngineError::type_mismatch(
                    name,
                    format!("Expected a reference value like {{fileID: 0}}, got '{value}'"),
                ));
            }
        }
        ValueShape::InlineStruct => {
            if !value.starts_with('{') {
                return Err(EngineError::type_mismatch(
                    name,
                    format!(
                        "Expected a compound value like {{x: 0, y: 0, z: 0}}, got '{value}'; \
                         edit a sub-field with {name}.<axis> instead"
                    ),
                ));
            }
        }
        ValueShape::BlockStruct => {
            return Err(EngineError::type_mismatch(
                name,
                "the value is a nested map; edit its sub-fields individually",
            ));
        }
        ValueShape::EmptyArray | ValueShape::InlineArray => {
            if !value.starts_with('[') {
                return Err(EngineError::type_mismatch(
                    name,
                    format!("Expected an array value like [], got '{value}'"),
                ));
            }
        }
        ValueShape::MultilineArray => {
            return Err(EngineError::type_mismatch(
                name,
                format!("the value is a multiline array; edit elements via {name}.Array.data[i]"),
            ));
        }
        ValueShape::Numeric => {
            let numeric = Regex::new(r"^-?\d+(\.\d+)?([eE][+-]?\d+)?$").expect("Invalid regex");
            if !numeric.is_match(value) {
                return Err(EngineError::type_mismatch(
                    name,
                    format!("Expected a numeric value, got '{value}'"),
                ));
            }
        }
        ValueShape::Text => {}
    }
    Ok(())
}

/// Format a float the way Unity's serializer does: 32-bit shortest form,
/// integers without a decimal point.
pub(crate) fn fmt_num(v: f64) -> String {
    let f = v as f32;
    if f == f.trunc() && f.abs() < 1e9 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

/// Quaternion from Euler degrees with Unity's rotation order: Z, then X,
/// then Y. Returns (x, y, z, w).
pub(crate) fn euler_to_quaternion(x_deg: f64, y_deg: f64, z_deg: f64) -> (f64, f64, f64, f64) {
    let half = std::f64::consts::PI / 360.0;
    let (sx, cx) = (x_deg * half).sin_cos();
    let (sy, cy) = (y_deg * half).sin_cos();
    let (sz, cz) = (z_deg * half).sin_cos();

    // q_y ⊗ q_x ⊗ q_z: applying Z first, then X, then Y
    let qx = (sx, 0.0, 0.0, cx);
    let qy = (0.0, sy, 0.0, cy);
    let qz = (0.0, 0.0, sz, cz);
    mul(mul(qy, qx), qz)
}

fn mul(a: (f64, f64, f64, f64), b: (f64, f64, f64, f64)) -> (f64, f64, f64, f64) {
    let (ax, ay, az, aw) = a;
    let (bx, by, bz, bw) = b;
    (
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
        aw * bw - ax * bx - ay * by - az * bz,
    )
}

/// Set position, rotation (Euler degrees), and/or scale on a Transform,
/// writing the quaternion and echoing the Euler input into the hint field.
pub fn edit_transform(
    file: &str,
    transform: &str,
    position: Option<(f64, f64, f64)>,
    rotation: Option<(f64, f64, f64)>,
    scale: Option<(f64, f64, f64)>,
) -> Result<EditReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    let tf_id = doc.require_unique_transform(transform)?;
    {
        let block = doc
            .find_by_file_id(&tf_id)
            .ok_or_else(|| EngineError::not_found("Transform", tf_id.clone()))?;
        if block.is_stripped() {
            return Err(EngineError::policy(format!(
                "Transform {tf_id} is a stripped prefab handle; edit the PrefabInstance override instead"
            )));
        }
    }
    let block = doc
        .find_by_file_id_mut(&tf_id)
        .ok_or_else(|| EngineError::not_found("Transform", tf_id.clone()))?;

    if let Some(p) = position {
        validate_vector3(p, "position")?;
        block.set_property(
            "m_LocalPosition",
            &format!("{{x: {}, y: {}, z: {}}}", fmt_num(p.0), fmt_num(p.1), fmt_num(p.2)),
        )?;
    }
    if let Some(r) = rotation {
        validate_vector3(r, "rotation")?;
        let (qx, qy, qz, qw) = euler_to_quaternion(r.0, r.1, r.2);
        block.set_property(
            "m_LocalRotation",
            &format!(
                "{{x: {}, y: {}, z: {}, w: {}}}",
                fmt_num(qx),
                fmt_num(qy),
                fmt_num(qz),
                fmt_num(qw)
            ),
        )?;
        let hint = format!("{{x: {}, y: {}, z: {}}}", fmt_num(r.0), fmt_num(r.1), fmt_num(r.2));
        if block.get_property("m_LocalEulerAnglesHint").is_some() {
            block.set_property("m_LocalEulerAnglesHint", &hint)?;
        }
    }
    if let Some(s) = scale {
        validate_vector3(s, "scale")?;
        block.set_property(
            "m_LocalScale",
            &format!("{{x: {}, y: {}, z: {}}}", fmt_num(s.0), fmt_num(s.1), fmt_num(s.2)),
        )?;
    }

    doc.validate()?;
    let written = doc.save(None)?;
    Ok(EditReport {
        file: file.to_string(),
        bytes_written: written,
    })
}

/// One edit in a batch.
#[derive(Debug, Clone)]
pub enum BatchEdit {
    Component {
        file_id: String,
        property: String,
        value: String,
    },
    GameObject {
        target: String,
        property: String,
        value: String,
    },
}

/// Apply many edits with one load, one validation, and one atomic save.
pub fn batch_edit(file: &str, edits: &[BatchEdit]) -> Result<BatchEditReport> {
    validate_file_path(file, PathMode::Write)?;
    let mut doc = Document::from_file(file, true)?;
    for edit in edits {
        match edit {
            BatchEdit::Component {
                file_id,
                property,
                value,
            } => {
                apply_component_edit(&mut doc, file_id, property, value)?;
            }
            BatchEdit::GameObject {
                target,
                property,
                value,
            } => {
                apply_game_object_edit(&mut doc, target, property, value, None, None)?;
            }
        }
    }
    doc.validate()?;
    let written = doc.save(None)?;
    Ok(BatchEditReport {
        file: file.to_string(),
        applied: edits.len(),
        bytes_written: written,
    })
}
