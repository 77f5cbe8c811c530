//! Text templates for everything the engine synthesizes from scratch:
//! GameObject/Transform pairs, scene settings blocks, prefab-variant
//! scaffolding, and companion meta files.

/// MonoScript marker used by script references inside MonoBehaviours.
pub const MONO_SCRIPT_FILE_ID: &str = "11500000";
/// Source-prefab marker inside `m_SourcePrefab`.
pub const SOURCE_PREFAB_FILE_ID: &str = "100100000";
/// Anchor of the single MonoBehaviour inside a ScriptableObject asset.
pub const SCRIPTABLE_OBJECT_ANCHOR: &str = "11400000";

pub const SCENE_HEADER: &str = "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n";

/// The four settings blocks every scene carries, anchored `&1`..`&4`.
pub fn scene_settings_blocks() -> String {
    "--- !u!29 &1\nOcclusionCullingSettings:\n  m_ObjectHideFlags: 0\n  serializedVersion: 2\n  m_OcclusionBakeSettings:\n    smallestOccluder: 5\n    smallestHole: 0.25\n    backfaceThreshold: 100\n  m_SceneGUID: 00000000000000000000000000000000\n  m_OcclusionCullingData: {fileID: 0}\n\
--- !u!104 &2\nRenderSettings:\n  m_ObjectHideFlags: 0\n  serializedVersion: 9\n  m_Fog: 0\n  m_FogColor: {r: 0.5, g: 0.5, b: 0.5, a: 1}\n  m_FogMode: 3\n  m_FogDensity: 0.01\n  m_LinearFogStart: 0\n  m_LinearFogEnd: 300\n  m_AmbientSkyColor: {r: 0.212, g: 0.227, b: 0.259, a: 1}\n  m_AmbientEquatorColor: {r: 0.114, g: 0.125, b: 0.133, a: 1}\n  m_AmbientGroundColor: {r: 0.047, g: 0.043, b: 0.035, a: 1}\n  m_AmbientIntensity: 1\n  m_AmbientMode: 3\n  m_SubtractiveShadowColor: {r: 0.42, g: 0.478, b: 0.627, a: 1}\n  m_SkyboxMaterial: {fileID: 0}\n  m_HaloStrength: 0.5\n  m_FlareStrength: 1\n  m_FlareFadeSpeed: 3\n  m_HaloTexture: {fileID: 0}\n  m_SpotCookie: {fileID: 10001, guid: 0000000000000000e000000000000000, type: 0}\n  m_DefaultReflectionMode: 0\n  m_DefaultReflectionResolution: 128\n  m_ReflectionBounces: 1\n  m_ReflectionIntensity: 1\n  m_CustomReflection: {fileID: 0}\n  m_Sun: {fileID: 0}\n  m_IndirectSpecularColor: {r: 0, g: 0, b: 0, a: 1}\n  m_UseRadianceAmbientProbe: 0\n\
--- !u!157 &3\nLightmapSettings:\n  m_ObjectHideFlags: 0\n  serializedVersion: 12\n  m_GIWorkflowMode: 1\n  m_GISettings:\n    serializedVersion: 2\n    m_BounceScale: 1\n    m_IndirectOutputScale: 1\n    m_AlbedoBoost: 1\n    m_EnvironmentLightingMode: 0\n    m_EnableBakedLightmaps: 1\n    m_EnableRealtimeLightmaps: 0\n  m_LightingDataAsset: {fileID: 0}\n  m_LightingSettings: {fileID: 0}\n\
--- !u!196 &4\nNavMeshSettings:\n  serializedVersion: 2\n  m_ObjectHideFlags: 0\n  m_BuildSettings:\n    serializedVersion: 3\n    agentTypeID: 0\n    agentRadius: 0.5\n    agentHeight: 2\n    agentSlope: 45\n    agentClimb: 0.4\n    ledgeDropHeight: 0\n    maxJumpAcrossDistance: 0\n    minRegionArea: 2\n    manualCellSize: 0\n    cellSize: 0.16666667\n    manualTileSize: 0\n    tileSize: 256\n    buildHeightMesh: 0\n    maxJobWorkers: 0\n    preserveTilesOutsideBounds: 0\n    debug:\n      m_Flags: 0\n  m_NavMeshData: {fileID: 0}\n"
        .to_string()
}

/// A full (non-stripped) GameObject block. The first component id must be
/// the Transform.
pub fn game_object_block(
    go_id: &str,
    component_ids: &[&str],
    name: &str,
    layer: u32,
    tag: &str,
) -> String {
    let components: String = component_ids
        .iter()
        .map(|id| format!("  - component: {{fileID: {id}}}\n"))
        .collect();
    format!(
        "--- !u!1 &{go_id}\nGameObject:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  serializedVersion: 6\n  m_Component:\n{components}  m_Layer: {layer}\n  m_Name: {name}\n  m_TagString: {tag}\n  m_Icon: {{fileID: 0}}\n  m_NavMeshLayer: 0\n  m_StaticEditorFlags: 0\n  m_IsActive: 1\n"
    )
}

/// A Transform block. `position` and `rotation_with_hint` override the
/// identity defaults for the template-built scene objects.
pub fn transform_block(
    transform_id: &str,
    go_id: &str,
    father_id: &str,
    root_order: usize,
    position: &str,
    rotation: &str,
    euler_hint: &str,
) -> String {
    format!(
        "--- !u!4 &{transform_id}\nTransform:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_LocalRotation: {rotation}\n  m_LocalPosition: {position}\n  m_LocalScale: {{x: 1, y: 1, z: 1}}\n  m_ConstrainProportionsScale: 0\n  m_Children: []\n  m_Father: {{fileID: {father_id}}}\n  m_RootOrder: {root_order}\n  m_LocalEulerAnglesHint: {euler_hint}\n"
    )
}

/// Identity-placed Transform.
pub fn default_transform_block(
    transform_id: &str,
    go_id: &str,
    father_id: &str,
    root_order: usize,
) -> String {
    transform_block(
        transform_id,
        go_id,
        father_id,
        root_order,
        "{x: 0, y: 0, z: 0}",
        "{x: 0, y: 0, z: 0, w: 1}",
        "{x: 0, y: 0, z: 0}",
    )
}

/// A MonoBehaviour component block for a custom script, with optional
/// pre-rendered serialized-field default lines.
pub fn mono_behaviour_block(
    file_id: &str,
    go_id: &str,
    script_guid: &str,
    field_defaults: &str,
) -> String {
    format!(
        "--- !u!114 &{file_id}\nMonoBehaviour:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_Enabled: 1\n  m_EditorHideFlags: 0\n  m_Script: {{fileID: {MONO_SCRIPT_FILE_ID}, guid: {script_guid}, type: 3}}\n  m_Name: \n  m_EditorClassIdentifier: \n{field_defaults}"
    )
}

/// The single MonoBehaviour inside a ScriptableObject `.asset`, anchored at
/// the conventional `&11400000`.
pub fn scriptable_object_asset(name: &str, script_guid: &str, field_defaults: &str) -> String {
    format!(
        "{SCENE_HEADER}--- !u!114 &{SCRIPTABLE_OBJECT_ANCHOR}\nMonoBehaviour:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: 0}}\n  m_Enabled: 1\n  m_EditorHideFlags: 0\n  m_Script: {{fileID: {MONO_SCRIPT_FILE_ID}, guid: {script_guid}, type: 3}}\n  m_Name: {name}\n  m_EditorClassIdentifier: \n{field_defaults}"
    )
}

/// The PrefabInstance block of a freshly created prefab variant, carrying a
/// single `m_Name` override.
pub fn variant_prefab_instance_block(
    pi_id: &str,
    source_go_id: &str,
    source_guid: &str,
    variant_name: &str,
) -> String {
    format!(
        "--- !u!1001 &{pi_id}\nPrefabInstance:\n  m_ObjectHideFlags: 0\n  serializedVersion: 2\n  m_Modification:\n    serializedVersion: 3\n    m_TransformParent: {{fileID: 0}}\n    m_Modifications:\n    - target: {{fileID: {source_go_id}, guid: {source_guid}, type: 3}}\n      propertyPath: m_Name\n      value: {variant_name}\n      objectReference: {{fileID: 0}}\n    m_RemovedComponents: []\n    m_RemovedGameObjects: []\n    m_AddedGameObjects: []\n    m_AddedComponents: []\n  m_SourcePrefab: {{fileID: {SOURCE_PREFAB_FILE_ID}, guid: {source_guid}, type: 3}}\n"
    )
}

/// A stripped handle block pointing into a prefab instance's source.
pub fn stripped_block(
    class_id: u32,
    type_name: &str,
    file_id: &str,
    source_file_id: &str,
    source_guid: &str,
    pi_id: &str,
) -> String {
    format!(
        "--- !u!{class_id} &{file_id} stripped\n{type_name}:\n  m_CorrespondingSourceObject: {{fileID: {source_file_id}, guid: {source_guid}, type: 3}}\n  m_PrefabInstance: {{fileID: {pi_id}}}\n  m_PrefabAsset: {{fileID: 0}}\n"
    )
}

// --- meta files ---

pub fn mono_importer_meta(guid: &str) -> String {
    format!(
        "fileFormatVersion: 2\nguid: {guid}\nMonoImporter:\n  externalObjects: {{}}\n  serializedVersion: 2\n  defaultReferences: []\n  executionOrder: 0\n  icon: {{instanceID: 0}}\n  userData: \n  assetBundleName: \n  assetBundleVariant: \n"
    )
}

pub fn native_format_importer_meta(guid: &str, main_object_file_id: &str) -> String {
    format!(
        "fileFormatVersion: 2\nguid: {guid}\nNativeFormatImporter:\n  externalObjects: {{}}\n  mainObjectFileID: {main_object_file_id}\n  userData: \n  assetBundleName: \n  assetBundleVariant: \n"
    )
}

pub fn prefab_importer_meta(guid: &str) -> String {
    format!(
        "fileFormatVersion: 2\nguid: {guid}\nPrefabImporter:\n  externalObjects: {{}}\n  userData: \n  assetBundleName: \n  assetBundleVariant: \n"
    )
}

pub fn default_importer_meta(guid: &str) -> String {
    format!(
        "fileFormatVersion: 2\nguid: {guid}\nDefaultImporter:\n  externalObjects: {{}}\n  userData: \n  assetBundleName: \n  assetBundleVariant: \n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_settings_blocks_parse_with_expected_anchors() {
        let text = format!("{SCENE_HEADER}{}", scene_settings_blocks());
        let doc = Document::from_string(&text, true).unwrap();
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
    }

    #[test]
    fn test_game_object_and_transform_pair_parse() {
        let text = format!(
            "{SCENE_HEADER}{}{}",
            game_object_block("100", &["101"], "Thing", 0, "Untagged"),
            default_transform_block("101", "100", "0", 0),
        );
        let doc = Document::from_string(&text, true).unwrap();
        assert_eq!(doc.require_unique_game_object("Thing").unwrap(), "100");
        assert_eq!(doc.transform_of_game_object("100").unwrap(), "101");
        assert_eq!(doc.parent_of("101").unwrap(), "0");
    }

    #[test]
    fn test_variant_scaffolding_parses() {
        let guid = "a1b2c3d4e5f6789012345678abcdef12";
        let text = format!(
            "{SCENE_HEADER}{}{}{}",
            stripped_block(1, "GameObject", "500", "100000", guid, "700"),
            stripped_block(4, "Transform", "501", "400000", guid, "700"),
            variant_prefab_instance_block("700", "100000", guid, "Enemy Variant"),
        );
        let doc = Document::from_string(&text, true).unwrap();
        let root = doc.find_prefab_root().unwrap();
        assert_eq!(root.go_id, "500");
        assert_eq!(root.transform_id, "501");
        assert_eq!(root.name, "Enemy Variant");
    }

    #[test]
    fn test_meta_templates_carry_guid_line() {
        let guid = "aabbccdd11223344aabbccdd11223344";
        for meta in [
            mono_importer_meta(guid),
            native_format_importer_meta(guid, SCRIPTABLE_OBJECT_ANCHOR),
            prefab_importer_meta(guid),
            default_importer_meta(guid),
        ] {
            assert!(meta.starts_with("fileFormatVersion: 2\n"));
            assert!(meta.contains(&format!("guid: {guid}\n")));
        }
    }
}
