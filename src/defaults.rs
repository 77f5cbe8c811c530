//! Default-value YAML emitter: maps a serialized field's declared C# type
//! (plus the engine version, for version-gated structs) to the snippet Unity
//! would write for its default value.

use tracing::warn;

use crate::resolve::{ScriptField, UnityVersion};

/// The YAML form of one field's default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// Scalar or flow text placed after `name: `.
    Inline(String),
    /// Nested lines placed under `name:`, already newline-separated and
    /// un-indented.
    Block(String),
    /// The field is not serialized for this engine version (or not at all).
    Skip,
}

/// Reference-typed Unity classes whose serialized default is a null object
/// reference.
const REFERENCE_TYPES: &[&str] = &[
    "GameObject",
    "Transform",
    "RectTransform",
    "Component",
    "Behaviour",
    "MonoBehaviour",
    "ScriptableObject",
    "Object",
    "UnityEngine.Object",
    "Material",
    "Shader",
    "Mesh",
    "Texture",
    "Texture2D",
    "Texture3D",
    "RenderTexture",
    "Sprite",
    "AudioClip",
    "AnimationClip",
    "AnimationCurve",
    "Animator",
    "Font",
    "TextAsset",
    "ParticleSystem",
    "Camera",
    "Light",
    "Rigidbody",
    "Rigidbody2D",
    "Collider",
    "Collider2D",
];

/// Map one declared type name to its serialized default.
///
/// Unknown types fall back to `{fileID: 0}`: in real MonoBehaviours these
/// are overwhelmingly object references, and an incorrect-but-harmless null
/// reference beats dropping the field — the editor repairs it on the next
/// inspection.
pub fn default_yaml_for_type(type_name: &str, version: Option<&UnityVersion>) -> DefaultValue {
    let type_name = type_name.trim();

    // nullable fields are not serialized
    if type_name.ends_with('?') {
        return DefaultValue::Skip;
    }
    // arrays and lists
    if type_name.ends_with("[]")
        || type_name.starts_with("List<")
        || type_name.starts_with("System.Collections.Generic.List<")
    {
        return DefaultValue::Inline("[]".to_string());
    }

    match type_name {
        // numeric primitives and their .NET aliases
        "int" | "long" | "short" | "byte" | "sbyte" | "uint" | "ulong" | "ushort" | "float"
        | "double" | "bool" | "char" | "Int32" | "Int64" | "Int16" | "UInt32" | "UInt64"
        | "UInt16" | "Byte" | "SByte" | "Single" | "Double" | "Boolean" => {
            DefaultValue::Inline("0".to_string())
        }
        "string" | "String" => DefaultValue::Inline(String::new()),

        // inline structs with a stable representation across versions
        "Vector2" => DefaultValue::Inline("{x: 0, y: 0}".to_string()),
        "Vector3" => DefaultValue::Inline("{x: 0, y: 0, z: 0}".to_string()),
        "Vector4" => DefaultValue::Inline("{x: 0, y: 0, z: 0, w: 0}".to_string()),
        "Vector2Int" => DefaultValue::Inline("{x: 0, y: 0}".to_string()),
        "Vector3Int" => DefaultValue::Inline("{x: 0, y: 0, z: 0}".to_string()),
        "Quaternion" => DefaultValue::Inline("{x: 0, y: 0, z: 0, w: 1}".to_string()),
        "Color" | "Color32" => DefaultValue::Inline("{r: 0, g: 0, b: 0, a: 0}".to_string()),
        "Rect" => DefaultValue::Inline(
            "{serializedVersion: 2, x: 0, y: 0, width: 0, height: 0}".to_string(),
        ),
        "RectInt" => DefaultValue::Inline("{x: 0, y: 0, width: 0, height: 0}".to_string()),
        "RectOffset" => {
            DefaultValue::Inline("{m_Left: 0, m_Right: 0, m_Top: 0, m_Bottom: 0}".to_string())
        }
        "Matrix4x4" => DefaultValue::Inline(
            "{e00: 1, e01: 0, e02: 0, e03: 0, e10: 0, e11: 1, e12: 0, e13: 0, e20: 0, e21: 0, e22: 1, e23: 0, e30: 0, e31: 0, e32: 0, e33: 1}"
                .to_string(),
        ),
        "LayerMask" => DefaultValue::Inline("{serializedVersion: 2, m_Bits: 0}".to_string()),

        // version-gated structs
        "Hash128" => match version {
            Some(v) if v.at_least(2021, 1) => {
                DefaultValue::Inline("00000000000000000000000000000000".to_string())
            }
            _ => DefaultValue::Skip,
        },
        "RenderingLayerMask" => match version {
            Some(v) if v.major >= 6000 => {
                DefaultValue::Inline("{serializedVersion: 2, m_Bits: 1}".to_string())
            }
            _ => DefaultValue::Skip,
        },

        // block-style structs
        "Bounds" => DefaultValue::Block(
            "m_Center: {x: 0, y: 0, z: 0}\nm_Extent: {x: 0, y: 0, z: 0}".to_string(),
        ),
        "BoundsInt" => DefaultValue::Block(
            "m_Position: {x: 0, y: 0, z: 0}\nm_Size: {x: 0, y: 0, z: 0}".to_string(),
        ),

        other => {
            let bare = other.rsplit('.').next().unwrap_or(other);
            if !REFERENCE_TYPES.contains(&other) && !REFERENCE_TYPES.contains(&bare) {
                // unresolved custom class or enum: treat as an object
                // reference, which the editor repairs on next inspection
                tracing::debug!(type_name = other, "unknown field type, defaulting to null reference");
            }
            DefaultValue::Inline("{fileID: 0}".to_string())
        }
    }
}

/// Render serialized-field defaults as MonoBehaviour body lines (two-space
/// indent, source order). Returns the text plus warnings for fields that
/// were skipped.
pub fn emit_field_defaults(
    fields: &[ScriptField],
    version: Option<&UnityVersion>,
) -> (String, Vec<String>) {
    let mut out = String::new();
    let mut warnings = Vec::new();
    for field in fields {
        if !field.is_public && !field.has_serialize_field {
            continue;
        }
        if field.has_serialize_reference {
            warnings.push(format!(
                "field '{}' uses SerializeReference and was skipped",
                field.name
            ));
            continue;
        }
        match default_yaml_for_type(&field.type_name, version) {
            DefaultValue::Inline(value) => {
                out.push_str(&format!("  {}: {}\n", field.name, value));
            }
            DefaultValue::Block(body) => {
                out.push_str(&format!("  {}:\n", field.name));
                for line in body.lines() {
                    out.push_str(&format!("    {line}\n"));
                }
            }
            DefaultValue::Skip => {
                if field.type_name == "Hash128" || field.type_name == "RenderingLayerMask" {
                    warn!(field = %field.name, type_name = %field.type_name, "field skipped by version gate");
                    warnings.push(format!(
                        "field '{}' ({}) requires a newer engine version and was skipped",
                        field.name, field.type_name
                    ));
                }
            }
        }
    }
    (out, warnings)
}
