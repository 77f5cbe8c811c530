//! Creation operations: GameObjects, scenes, prefab variants,
//! ScriptableObjects, and companion meta files.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::classes;
use crate::common::{
    generate_guid, random_file_id, CreateGameObjectReport, CreateMetaReport,
    CreatePrefabVariantReport, CreateSceneReport, CreateScriptableObjectReport, EngineError,
    Result,
};
use crate::defaults::emit_field_defaults;
use crate::document::Document;
use crate::ops::templates;
use crate::ops::{file_stem_of, guid_from_meta, meta_path_of, prefab_instance_of};
use crate::resolve::{ProjectSettingsSource, ScriptResolver};
use crate::validate::{validate_file_path, validate_guid, validate_name, PathMode};
use crate::writer;

/// Create a GameObject with its Transform, optionally under a parent given
/// by name or Transform/GameObject file id.
///
/// In a document whose roots are prefab-instance handles (a variant file),
/// a parentless create attaches to the first stripped Transform and records
/// the object in that instance's `m_AddedGameObjects`.
pub fn create_game_object(
    file: &str,
    name: &str,
    parent: Option<&str>,
) -> Result<CreateGameObjectReport> {
    validate_file_path(file, PathMode::Write)?;
    validate_name(name, "GameObject name")?;
    let mut doc = Document::from_file(file, true)?;

    let parent_tf: Option<String> = match parent {
        Some(p) => Some(doc.require_unique_transform(p)?),
        None => {
            if doc.find_by_class_id(classes::PREFAB_INSTANCE).is_empty() {
                None
            } else {
                doc.blocks()
                    .iter()
                    .find(|b| classes::is_hierarchy_provider(b.class_id()) && b.is_stripped())
                    .map(|b| b.file_id().to_string())
            }
        }
    };

    let go_id = doc.generate_file_id();
    let transform_id = loop {
        let id = doc.generate_file_id();
        if id != go_id {
            break id;
        }
    };

    let (father, root_order, layer, parent_is_stripped) = match &parent_tf {
        Some(tf) => {
            let stripped = doc
                .find_by_file_id(tf)
                .map(|b| b.is_stripped())
                .unwrap_or(false);
            let layer = if stripped {
                0
            } else {
                doc.game_object_of(tf)
                    .and_then(|go| doc.find_by_file_id(&go))
                    .and_then(|b| b.get_property("m_Layer"))
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0)
            };
            (tf.clone(), doc.calculate_root_order(tf), layer, stripped)
        }
        None => ("0".to_string(), doc.calculate_root_order("0"), 0, false),
    };

    doc.append_raw(&templates::game_object_block(
        &go_id,
        &[&transform_id],
        name,
        layer,
        "Untagged",
    ))?;
    doc.append_raw(&templates::default_transform_block(
        &transform_id,
        &go_id,
        &father,
        root_order,
    ))?;

    let mut prefab_instance_id = None;
    if let Some(tf) = &parent_tf {
        if parent_is_stripped {
            let (pi_id, source_ref) = {
                let stripped = doc
                    .find_by_file_id(tf)
                    .ok_or_else(|| EngineError::not_found("stripped Transform", tf.clone()))?;
                let pi = prefab_instance_of(stripped).ok_or_else(|| {
                    EngineError::not_found_hint(
                        "PrefabInstance",
                        tf.clone(),
                        "stripped Transform has no m_PrefabInstance reference",
                    )
                })?;
                let source_ref = stripped
                    .get_property("m_CorrespondingSourceObject")
                    .unwrap_or_else(|| "{fileID: 0}".to_string());
                (pi, source_ref)
            };
            let entry = format!(
                "targetCorrespondingSourceObject: {source_ref}\ninsertIndex: -1\naddedObject: {{fileID: {go_id}}}"
            );
            let pi_block = doc
                .find_by_file_id_mut(&pi_id)
                .ok_or_else(|| EngineError::not_found("PrefabInstance", pi_id.clone()))?;
            pi_block.insert_array_element("m_AddedGameObjects", -1, &entry)?;
            prefab_instance_id = Some(pi_id);
        } else {
            doc.add_child_to_parent(tf, &transform_id)?;
        }
    }

    doc.validate()?;
    doc.save(None)?;
    debug!(file, %go_id, %transform_id, "created GameObject");
    Ok(CreateGameObjectReport {
        file: file.to_string(),
        go_id,
        transform_id,
        prefab_instance_id,
        warnings: Vec::new(),
    })
}

/// Create a new scene file with the four settings blocks, optionally with
/// the default Main Camera and Directional Light, plus its companion meta.
pub fn create_scene(
    output_path: &str,
    include_defaults: bool,
    guid: Option<&str>,
) -> Result<CreateSceneReport> {
    validate_file_path(output_path, PathMode::Write)?;
    if Path::new(output_path).exists() {
        return Err(EngineError::AlreadyExists {
            path: output_path.to_string(),
        });
    }
    let scene_guid = match guid {
        Some(g) => {
            validate_guid(g)?;
            g.to_string()
        }
        None => generate_guid(),
    };

    let mut content = format!("{}{}", templates::SCENE_HEADER, templates::scene_settings_blocks());
    if include_defaults {
        content.push_str(&default_scene_objects());
    }

    writer::write_atomic(Path::new(output_path), &content)?;

    let meta_path = meta_path_of(output_path);
    let meta = templates::default_importer_meta(&scene_guid);
    if let Err(e) = writer::write_atomic(Path::new(&meta_path), &meta) {
        // roll the scene back so a half-created asset never survives
        let _ = fs::remove_file(output_path);
        return Err(e);
    }

    Ok(CreateSceneReport {
        scene_path: output_path.to_string(),
        meta_path,
        scene_guid,
    })
}

/// Main Camera and Directional Light blocks with fresh random ids.
fn default_scene_objects() -> String {
    let mut used: HashSet<String> = HashSet::new();
    let mut next_id = || loop {
        let id = random_file_id();
        if used.insert(id.clone()) {
            return id;
        }
    };
    let cam_go = next_id();
    let cam_tf = next_id();
    let cam = next_id();
    let listener = next_id();
    let light_go = next_id();
    let light_tf = next_id();
    let light = next_id();

    let mut out = String::new();
    out.push_str(&templates::game_object_block(
        &cam_go,
        &[&cam_tf, &cam, &listener],
        "Main Camera",
        0,
        "MainCamera",
    ));
    out.push_str(&format!(
        "--- !u!20 &{cam}\n{}",
        classes::default_component_body(classes::CAMERA, &cam_go).expect("camera body")
    ));
    out.push_str(&format!(
        "--- !u!81 &{listener}\n{}",
        classes::default_component_body(classes::AUDIO_LISTENER, &cam_go).expect("listener body")
    ));
    out.push_str(&templates::transform_block(
        &cam_tf,
        &cam_go,
        "0",
        0,
        "{x: 0, y: 1, z: -10}",
        "{x: 0, y: 0, z: 0, w: 1}",
        "{x: 0, y: 0, z: 0}",
    ));
    out.push_str(&templates::game_object_block(
        &light_go,
        &[&light_tf, &light],
        "Directional Light",
        0,
        "Untagged",
    ));
    out.push_str(&format!(
        "--- !u!108 &{light}\n{}",
        classes::default_component_body(classes::LIGHT, &light_go).expect("light body")
    ));
    out.push_str(&templates::transform_block(
        &light_tf,
        &light_go,
        "0",
        1,
        "{x: 0, y: 3, z: 0}",
        "{x: 0.40821788, y: -0.23456968, z: 0.10938163, w: 0.8754261}",
        "{x: 50, y: -30, z: 0}",
    ));
    out
}

/// Create a prefab variant: two stripped handle blocks plus a
/// PrefabInstance carrying the variant name as its only override.
pub fn create_prefab_variant(
    source_path: &str,
    output_path: &str,
    variant_name: Option<&str>,
) -> Result<CreatePrefabVariantReport> {
    validate_file_path(source_path, PathMode::Read)?;
    validate_file_path(output_path, PathMode::Write)?;
    if Path::new(output_path).exists() {
        return Err(EngineError::AlreadyExists {
            path: output_path.to_string(),
        });
    }
    let source_guid = guid_from_meta(&meta_path_of(source_path))?;
    let source = Document::from_file(source_path, true)?;
    let root = source.find_prefab_root()?;

    let name = match variant_name {
        Some(n) => {
            validate_name(n, "variant name")?;
            n.to_string()
        }
        None => file_stem_of(output_path),
    };

    let mut used: HashSet<String> = HashSet::new();
    let mut next_id = || loop {
        let id = random_file_id();
        if used.insert(id.clone()) {
            return id;
        }
    };
    let pi_id = next_id();
    let go_id = next_id();
    let tf_id = next_id();

    let content = format!(
        "{}{}{}{}",
        templates::SCENE_HEADER,
        templates::variant_prefab_instance_block(&pi_id, &root.go_id, &source_guid, &name),
        templates::stripped_block(1, "GameObject", &go_id, &root.go_id, &source_guid, &pi_id),
        templates::stripped_block(
            4,
            "Transform",
            &tf_id,
            &root.transform_id,
            &source_guid,
            &pi_id
        ),
    );
    writer::write_atomic(Path::new(output_path), &content)?;

    let meta_path = meta_path_of(output_path);
    let meta = templates::prefab_importer_meta(&generate_guid());
    if let Err(e) = writer::write_atomic(Path::new(&meta_path), &meta) {
        let _ = fs::remove_file(output_path);
        return Err(e);
    }

    Ok(CreatePrefabVariantReport {
        prefab_path: output_path.to_string(),
        meta_path,
        source_guid,
        prefab_instance_id: pi_id,
    })
}

/// Create a ScriptableObject `.asset` for a custom script resolved through
/// the caller's type registry.
pub fn create_scriptable_object(
    output_path: &str,
    script: &str,
    project_path: Option<&Path>,
    resolver: &dyn ScriptResolver,
    settings: Option<&dyn ProjectSettingsSource>,
) -> Result<CreateScriptableObjectReport> {
    validate_file_path(output_path, PathMode::Write)?;
    if Path::new(output_path).exists() {
        return Err(EngineError::AlreadyExists {
            path: output_path.to_string(),
        });
    }
    if classes::is_builtin_class_name(script) {
        return Err(EngineError::policy(format!(
            "'{script}' is a built-in Unity class; ScriptableObjects need a custom script"
        )));
    }
    let info = resolver.resolve_script(script, project_path).ok_or_else(|| {
        EngineError::not_found_hint(
            "script",
            script,
            "not in the type registry; run setup to build the GUID cache",
        )
    })?;
    validate_guid(&info.guid)?;
    match info.kind.as_deref() {
        Some("enum") | Some("interface") => {
            return Err(EngineError::policy(format!(
                "'{script}' is an {}; only classes can back a ScriptableObject",
                info.kind.as_deref().unwrap_or("enum")
            )));
        }
        _ => {}
    }
    if let Some(base) = info.base_class.as_deref() {
        if base != "ScriptableObject" {
            return Err(EngineError::policy(format!(
                "'{script}' derives from {base}, expected ScriptableObject"
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
    if info.fields.is_none() {
        warnings.push("field extraction unavailable; asset carries no serialized defaults".to_string());
    }

    let asset_name = file_stem_of(output_path);
    let content = templates::scriptable_object_asset(&asset_name, &info.guid, &field_defaults);
    writer::write_atomic(Path::new(output_path), &content)?;

    let asset_guid = generate_guid();
    let meta_path = meta_path_of(output_path);
    let meta =
        templates::native_format_importer_meta(&asset_guid, templates::SCRIPTABLE_OBJECT_ANCHOR);
    if let Err(e) = writer::write_atomic(Path::new(&meta_path), &meta) {
        let _ = fs::remove_file(output_path);
        return Err(e);
    }

    if !warnings.is_empty() {
        warn!(output_path, warnings = ?warnings, "scriptable object created with warnings");
    }
    Ok(CreateScriptableObjectReport {
        asset_path: output_path.to_string(),
        meta_path,
        script_guid: info.guid,
        asset_guid,
        warning: if warnings.is_empty() {
            None
        } else {
            Some(warnings.join("; "))
        },
    })
}

/// Create a MonoImporter meta file next to a script. Never overwrites.
pub fn create_meta(script_path: &str) -> Result<CreateMetaReport> {
    validate_file_path(script_path, PathMode::Write)?;
    let meta_path = meta_path_of(script_path);
    if Path::new(&meta_path).exists() {
        return Err(EngineError::AlreadyExists { path: meta_path });
    }
    let guid = generate_guid();
    writer::write_atomic(Path::new(&meta_path), &templates::mono_importer_meta(&guid))?;
    Ok(CreateMetaReport { meta_path, guid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{ScriptField, ScriptInfo};

    struct FakeResolver {
        info: Option<ScriptInfo>,
    }

    impl ScriptResolver for FakeResolver {
        fn resolve_script(&self, _ident: &str, _project: Option<&Path>) -> Option<ScriptInfo> {
            self.info.clone()
        }
    }

    fn scene_path(dir: &tempfile::TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[test]
    fn test_create_scene_minimal() {
        let dir = tempfile::tempdir().unwrap();
        let path = scene_path(&dir, "Empty.unity");
        let report = create_scene(&path, false, None).unwrap();
        assert_eq!(report.scene_path, path);
        assert!(Path::new(&report.meta_path).exists());

        let doc = Document::from_file(&path, true).unwrap();
        let ids: Vec<(u32, String)> = doc
            .blocks()
            .iter()
            .map(|b| (b.class_id(), b.file_id().to_string()))
            .collect();
        assert_eq!(
            ids,
            vec![
                (29, "1".to_string()),
                (104, "2".to_string()),
                (157, "3".to_string()),
                (196, "4".to_string()),
            ]
        );
        let meta = std::fs::read_to_string(&report.meta_path).unwrap();
        assert!(meta.contains(&format!("guid: {}", report.scene_guid)));
    }

    #[test]
    fn test_create_scene_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = scene_path(&dir, "Full.unity");
        create_scene(&path, true, None).unwrap();
        let doc = Document::from_file(&path, true).unwrap();
        assert!(doc.require_unique_game_object("Main Camera").is_ok());
        assert!(doc.require_unique_game_object("Directional Light").is_ok());
        assert_eq!(doc.find_by_class_id(20).len(), 1);
        assert_eq!(doc.find_by_class_id(81).len(), 1);
        assert_eq!(doc.find_by_class_id(108).len(), 1);
        assert_eq!(doc.calculate_root_order("0"), 2);
    }

    #[test]
    fn test_create_scene_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = scene_path(&dir, "Dup.unity");
        create_scene(&path, false, None).unwrap();
        assert!(matches!(
            create_scene(&path, false, None),
            Err(EngineError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_create_game_object_at_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = scene_path(&dir, "S.unity");
        create_scene(&path, false, None).unwrap();
        let report = create_game_object(&path, "Thing", None).unwrap();

        let doc = Document::from_file(&path, true).unwrap();
        assert_eq!(doc.require_unique_game_object("Thing").unwrap(), report.go_id);
        assert_eq!(doc.parent_of(&report.transform_id).unwrap(), "0");
        let tf = doc.find_by_file_id(&report.transform_id).unwrap();
        assert_eq!(tf.get_property("m_RootOrder").unwrap(), "0");
        assert!(report.prefab_instance_id.is_none());
    }

    #[test]
    fn test_create_game_object_under_parent_inherits_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = scene_path(&dir, "S.unity");
        create_scene(&path, false, None).unwrap();
        let parent = create_game_object(&path, "Parent", None).unwrap();
        // push the parent onto a different layer first
        let mut doc = Document::from_file(&path, true).unwrap();
        doc.find_by_file_id_mut(&parent.go_id)
            .unwrap()
            .set_property("m_Layer", "5")
            .unwrap();
        doc.save(None).unwrap();

        let child = create_game_object(&path, "Child", Some("Parent")).unwrap();
        let doc = Document::from_file(&path, true).unwrap();
        assert_eq!(doc.parent_of(&child.transform_id).unwrap(), parent.transform_id);
        assert_eq!(doc.children_of(&parent.transform_id), vec![child.transform_id.clone()]);
        let go = doc.find_by_file_id(&child.go_id).unwrap();
        assert_eq!(go.get_property("m_Layer").unwrap(), "5");
    }

    #[test]
    fn test_create_game_object_sibling_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = scene_path(&dir, "S.unity");
        create_scene(&path, false, None).unwrap();
        create_game_object(&path, "A", None).unwrap();
        let b = create_game_object(&path, "B", None).unwrap();
        let doc = Document::from_file(&path, true).unwrap();
        let tf = doc.find_by_file_id(&b.transform_id).unwrap();
        assert_eq!(tf.get_property("m_RootOrder").unwrap(), "1");
    }

    #[test]
    fn test_create_game_object_rejects_bad_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = scene_path(&dir, "S.unity");
        create_scene(&path, false, None).unwrap();
        assert!(matches!(
            create_game_object(&path, "a/b", None),
            Err(EngineError::PolicyViolation(_))
        ));
    }

    #[test]
    fn test_create_prefab_variant() {
        let dir = tempfile::tempdir().unwrap();
        let source = scene_path(&dir, "Enemy.prefab");
        let guid = "a1b2c3d4e5f6789012345678abcdef12";
        let prefab = format!(
            "{}{}{}",
            templates::SCENE_HEADER,
            templates::game_object_block("100000", &["400000"], "Enemy", 0, "Untagged"),
            templates::default_transform_block("400000", "100000", "0", 0),
        );
        std::fs::write(&source, &prefab).unwrap();
        std::fs::write(
            format!("{source}.meta"),
            templates::prefab_importer_meta(guid),
        )
        .unwrap();

        let output = scene_path(&dir, "Enemy Variant.prefab");
        let report = create_prefab_variant(&source, &output, None).unwrap();
        assert_eq!(report.source_guid, guid);

        let doc = Document::from_file(&output, true).unwrap();
        let root = doc.find_prefab_root().unwrap();
        assert_eq!(root.name, "Enemy Variant");
        let pi = doc.find_by_file_id(&report.prefab_instance_id).unwrap();
        assert!(pi
            .raw()
            .contains(&format!("m_SourcePrefab: {{fileID: 100100000, guid: {guid}, type: 3}}")));
    }

    #[test]
    fn test_create_game_object_in_variant_records_added_object() {
        let dir = tempfile::tempdir().unwrap();
        let source = scene_path(&dir, "Enemy.prefab");
        let guid = "a1b2c3d4e5f6789012345678abcdef12";
        let prefab = format!(
            "{}{}{}",
            templates::SCENE_HEADER,
            templates::game_object_block("100000", &["400000"], "Enemy", 0, "Untagged"),
            templates::default_transform_block("400000", "100000", "0", 0),
        );
        std::fs::write(&source, &prefab).unwrap();
        std::fs::write(
            format!("{source}.meta"),
            templates::prefab_importer_meta(guid),
        )
        .unwrap();
        let variant = scene_path(&dir, "Enemy Variant.prefab");
        let created = create_prefab_variant(&source, &variant, None).unwrap();

        let report = create_game_object(&variant, "Extra", None).unwrap();
        assert_eq!(
            report.prefab_instance_id.as_deref(),
            Some(created.prefab_instance_id.as_str())
        );
        let doc = Document::from_file(&variant, true).unwrap();
        let root = doc.find_prefab_root().unwrap();
        assert_eq!(doc.parent_of(&report.transform_id).unwrap(), root.transform_id);
        let pi = doc.find_by_file_id(&created.prefab_instance_id).unwrap();
        assert_eq!(pi.get_array_length("m_AddedGameObjects"), Some(1));
        let entry = pi.array_element("m_AddedGameObjects", 0).unwrap();
        assert!(entry.contains(&format!("addedObject: {{fileID: {}}}", report.go_id)));
        assert!(entry.contains("insertIndex: -1"));
        assert!(entry.contains(&format!("targetCorrespondingSourceObject: {{fileID: 400000, guid: {guid}, type: 3}}")));
    }

    #[test]
    fn test_create_prefab_variant_needs_source_meta() {
        let dir = tempfile::tempdir().unwrap();
        let source = scene_path(&dir, "NoMeta.prefab");
        std::fs::write(&source, "%YAML 1.1\n").unwrap();
        let output = scene_path(&dir, "Out.prefab");
        assert!(create_prefab_variant(&source, &output, None).is_err());
    }

    #[test]
    fn test_create_scriptable_object() {
        let dir = tempfile::tempdir().unwrap();
        let output = scene_path(&dir, "Config.asset");
        let resolver = FakeResolver {
            info: Some(ScriptInfo {
                guid: "aabbccdd11223344aabbccdd11223344".to_string(),
                path: Some("Assets/Scripts/Config.cs".to_string()),
                kind: Some("class".to_string()),
                base_class: Some("ScriptableObject".to_string()),
                fields: Some(vec![ScriptField {
                    name: "speed".to_string(),
                    type_name: "float".to_string(),
                    has_serialize_field: false,
                    has_serialize_reference: false,
                    is_public: true,
                    owner_type: None,
                }]),
            }),
        };
        let report = create_scriptable_object(&output, "Config", None, &resolver, None).unwrap();
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("--- !u!114 &11400000\n"));
        assert!(content.contains("m_Name: Config\n"));
        assert!(content.contains("  speed: 0\n"));
        let meta = std::fs::read_to_string(&report.meta_path).unwrap();
        assert!(meta.contains("NativeFormatImporter"));
        assert!(meta.contains("mainObjectFileID: 11400000"));
        assert!(report.warning.is_none());
    }

    #[test]
    fn test_create_scriptable_object_rejects_wrong_base() {
        let dir = tempfile::tempdir().unwrap();
        let output = scene_path(&dir, "Bad.asset");
        let resolver = FakeResolver {
            info: Some(ScriptInfo {
                guid: "aabbccdd11223344aabbccdd11223344".to_string(),
                path: None,
                kind: Some("class".to_string()),
                base_class: Some("MonoBehaviour".to_string()),
                fields: None,
            }),
        };
        assert!(matches!(
            create_scriptable_object(&output, "Thing", None, &resolver, None),
            Err(EngineError::PolicyViolation(_))
        ));
    }

    #[test]
    fn test_create_scriptable_object_rejects_builtin_and_enum() {
        let dir = tempfile::tempdir().unwrap();
        let output = scene_path(&dir, "X.asset");
        let no_resolver = FakeResolver { info: None };
        assert!(matches!(
            create_scriptable_object(&output, "Camera", None, &no_resolver, None),
            Err(EngineError::PolicyViolation(_))
        ));
        let enum_resolver = FakeResolver {
            info: Some(ScriptInfo {
                guid: "aabbccdd11223344aabbccdd11223344".to_string(),
                path: None,
                kind: Some("enum".to_string()),
                base_class: None,
                fields: None,
            }),
        };
        assert!(matches!(
            create_scriptable_object(&output, "MyEnum", None, &enum_resolver, None),
            Err(EngineError::PolicyViolation(_))
        ));
    }

    #[test]
    fn test_create_meta_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let script = scene_path(&dir, "Foo.cs");
        std::fs::write(&script, "public class Foo {}").unwrap();
        let report = create_meta(&script).unwrap();
        assert!(Path::new(&report.meta_path).exists());
        assert_eq!(report.guid.len(), 32);
        assert!(matches!(
            create_meta(&script),
            Err(EngineError::AlreadyExists { .. })
        ));
    }
}
