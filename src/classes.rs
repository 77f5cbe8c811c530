//! Unity class-id registry: the built-in classes the engine knows how to
//! create, plus the predicates the hierarchy and script machinery relies on.

pub const GAME_OBJECT: u32 = 1;
pub const TRANSFORM: u32 = 4;
pub const CAMERA: u32 = 20;
pub const MESH_RENDERER: u32 = 23;
pub const OCCLUSION_CULLING_SETTINGS: u32 = 29;
pub const MESH_FILTER: u32 = 33;
pub const RIGIDBODY: u32 = 54;
pub const MESH_COLLIDER: u32 = 64;
pub const BOX_COLLIDER: u32 = 65;
pub const AUDIO_LISTENER: u32 = 81;
pub const AUDIO_SOURCE: u32 = 82;
pub const ANIMATOR: u32 = 95;
pub const RENDER_SETTINGS: u32 = 104;
pub const LIGHT: u32 = 108;
pub const MONO_BEHAVIOUR: u32 = 114;
pub const SPHERE_COLLIDER: u32 = 135;
pub const CAPSULE_COLLIDER: u32 = 136;
pub const LIGHTMAP_SETTINGS: u32 = 157;
pub const NAV_MESH_SETTINGS: u32 = 196;
pub const SPRITE_RENDERER: u32 = 212;
pub const RECT_TRANSFORM: u32 = 224;
pub const PREFAB_INSTANCE: u32 = 1001;

/// Class IDs that provide hierarchy information (Transform-like components).
pub fn is_hierarchy_provider(class_id: u32) -> bool {
    class_id == TRANSFORM || class_id == RECT_TRANSFORM
}

/// Class IDs that carry a script reference (MonoBehaviour-like components).
pub fn is_script_container(class_id: u32) -> bool {
    class_id == MONO_BEHAVIOUR
}

/// Built-in component class name → class id, for the classes the engine can
/// attach with [`default_component_body`].
pub fn class_id_of(name: &str) -> Option<u32> {
    let id = match name {
        "GameObject" => GAME_OBJECT,
        "Transform" => TRANSFORM,
        "Camera" => CAMERA,
        "MeshRenderer" => MESH_RENDERER,
        "MeshFilter" => MESH_FILTER,
        "Rigidbody" => RIGIDBODY,
        "MeshCollider" => MESH_COLLIDER,
        "BoxCollider" => BOX_COLLIDER,
        "AudioListener" => AUDIO_LISTENER,
        "AudioSource" => AUDIO_SOURCE,
        "Animator" => ANIMATOR,
        "Light" => LIGHT,
        "MonoBehaviour" => MONO_BEHAVIOUR,
        "SphereCollider" => SPHERE_COLLIDER,
        "CapsuleCollider" => CAPSULE_COLLIDER,
        "SpriteRenderer" => SPRITE_RENDERER,
        "RectTransform" => RECT_TRANSFORM,
        "PrefabInstance" => PREFAB_INSTANCE,
        _ => return None,
    };
    Some(id)
}

pub fn class_name_of(class_id: u32) -> Option<&'static str> {
    let name = match class_id {
        GAME_OBJECT => "GameObject",
        TRANSFORM => "Transform",
        CAMERA => "Camera",
        MESH_RENDERER => "MeshRenderer",
        OCCLUSION_CULLING_SETTINGS => "OcclusionCullingSettings",
        MESH_FILTER => "MeshFilter",
        RIGIDBODY => "Rigidbody",
        MESH_COLLIDER => "MeshCollider",
        BOX_COLLIDER => "BoxCollider",
        AUDIO_LISTENER => "AudioListener",
        AUDIO_SOURCE => "AudioSource",
        ANIMATOR => "Animator",
        RENDER_SETTINGS => "RenderSettings",
        LIGHT => "Light",
        MONO_BEHAVIOUR => "MonoBehaviour",
        SPHERE_COLLIDER => "SphereCollider",
        CAPSULE_COLLIDER => "CapsuleCollider",
        LIGHTMAP_SETTINGS => "LightmapSettings",
        NAV_MESH_SETTINGS => "NavMeshSettings",
        SPRITE_RENDERER => "SpriteRenderer",
        RECT_TRANSFORM => "RectTransform",
        PREFAB_INSTANCE => "PrefabInstance",
        _ => return None,
    };
    Some(name)
}

/// True for engine classes that may never be attached through the custom
/// script path.
pub fn is_builtin_class_name(name: &str) -> bool {
    class_id_of(name).is_some()
}

/// Minimal Unity-compatible body for an addable built-in component, wired to
/// its owning GameObject. `None` for classes the engine cannot attach
/// (GameObject, Transform, settings blocks, MonoBehaviour without a script).
pub fn default_component_body(class_id: u32, go_id: &str) -> Option<String> {
    let body = match class_id {
        BOX_COLLIDER => format!(
            "BoxCollider:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_Material: {{fileID: 0}}\n  m_IncludeLayers:\n    serializedVersion: 2\n    m_Bits: 0\n  m_ExcludeLayers:\n    serializedVersion: 2\n    m_Bits: 0\n  m_LayerOverridePriority: 0\n  m_IsTrigger: 0\n  m_ProvidesContacts: 0\n  m_Enabled: 1\n  serializedVersion: 3\n  m_Size: {{x: 1, y: 1, z: 1}}\n  m_Center: {{x: 0, y: 0, z: 0}}\n"
        ),
        SPHERE_COLLIDER => format!(
            "SphereCollider:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_Material: {{fileID: 0}}\n  m_IsTrigger: 0\n  m_Enabled: 1\n  serializedVersion: 3\n  m_Radius: 0.5\n  m_Center: {{x: 0, y: 0, z: 0}}\n"
        ),
        CAPSULE_COLLIDER => format!(
            "CapsuleCollider:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_Material: {{fileID: 0}}\n  m_IsTrigger: 0\n  m_Enabled: 1\n  m_Radius: 0.5\n  m_Height: 2\n  m_Direction: 1\n  m_Center: {{x: 0, y: 0, z: 0}}\n"
        ),
        MESH_COLLIDER => format!(
            "MeshCollider:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_Material: {{fileID: 0}}\n  m_IsTrigger: 0\n  m_Enabled: 1\n  serializedVersion: 5\n  m_Convex: 0\n  m_CookingOptions: 30\n  m_Mesh: {{fileID: 0}}\n"
        ),
        RIGIDBODY => format!(
            "Rigidbody:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  serializedVersion: 4\n  m_Mass: 1\n  m_Drag: 0\n  m_AngularDrag: 0.05\n  m_UseGravity: 1\n  m_IsKinematic: 0\n  m_Interpolate: 0\n  m_Constraints: 0\n  m_CollisionDetection: 0\n"
        ),
        MESH_RENDERER => format!(
            "MeshRenderer:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_Enabled: 1\n  m_CastShadows: 1\n  m_ReceiveShadows: 1\n  m_DynamicOccludee: 1\n  m_MotionVectors: 1\n  m_LightProbeUsage: 1\n  m_ReflectionProbeUsage: 1\n  m_RayTracingMode: 2\n  m_RenderingLayerMask: 1\n  m_Materials:\n  - {{fileID: 0}}\n  m_StaticBatchInfo:\n    firstSubMesh: 0\n    subMeshCount: 0\n  m_StaticBatchRoot: {{fileID: 0}}\n  m_ScaleInLightmap: 1\n  m_ReceiveGI: 1\n  m_SortingLayerID: 0\n  m_SortingLayer: 0\n  m_SortingOrder: 0\n"
        ),
        MESH_FILTER => format!(
            "MeshFilter:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_Mesh: {{fileID: 0}}\n"
        ),
        AUDIO_SOURCE => format!(
            "AudioSource:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_Enabled: 1\n  serializedVersion: 4\n  OutputAudioMixerGroup: {{fileID: 0}}\n  m_audioClip: {{fileID: 0}}\n  m_PlayOnAwake: 1\n  m_Volume: 1\n  m_Pitch: 1\n  Loop: 0\n  Mute: 0\n  Spatialize: 0\n  Priority: 128\n  DopplerLevel: 1\n  MinDistance: 1\n  MaxDistance: 500\n  rolloffMode: 0\n"
        ),
        AUDIO_LISTENER => format!(
            "AudioListener:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_Enabled: 1\n"
        ),
        ANIMATOR => format!(
            "Animator:\n  serializedVersion: 5\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_Enabled: 1\n  m_Avatar: {{fileID: 0}}\n  m_Controller: {{fileID: 0}}\n  m_CullingMode: 0\n  m_UpdateMode: 0\n  m_ApplyRootMotion: 0\n  m_LinearVelocityBlending: 0\n  m_KeepAnimatorStateOnDisable: 0\n"
        ),
        LIGHT => format!(
            "Light:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_Enabled: 1\n  serializedVersion: 10\n  m_Type: 1\n  m_Shape: 0\n  m_Color: {{r: 1, g: 1, b: 1, a: 1}}\n  m_Intensity: 1\n  m_Range: 10\n  m_SpotAngle: 30\n  m_InnerSpotAngle: 21.80208\n  m_CookieSize: 10\n  m_Shadows:\n    m_Type: 0\n    m_Resolution: -1\n    m_CustomResolution: -1\n    m_Strength: 1\n    m_Bias: 0.05\n    m_NormalBias: 0.4\n    m_NearPlane: 0.2\n  m_Cookie: {{fileID: 0}}\n  m_DrawHalo: 0\n  m_BounceIntensity: 1\n  m_ColorTemperature: 6570\n  m_UseColorTemperature: 0\n  m_RenderingLayerMask: 1\n  m_Lightmapping: 4\n  m_AreaSize: {{x: 1, y: 1}}\n"
        ),
        CAMERA => format!(
            "Camera:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_Enabled: 1\n  serializedVersion: 2\n  m_ClearFlags: 1\n  m_BackGroundColor: {{r: 0.19215687, g: 0.3019608, b: 0.4745098, a: 0}}\n  m_projectionMatrixMode: 1\n  m_GateFitMode: 2\n  m_FOVAxisMode: 0\n  m_SensorSize: {{x: 36, y: 24}}\n  m_LensShift: {{x: 0, y: 0}}\n  m_FocalLength: 50\n  m_NormalizedViewPortRect:\n    serializedVersion: 2\n    x: 0\n    y: 0\n    width: 1\n    height: 1\n  near clip plane: 0.3\n  far clip plane: 1000\n  field of view: 60\n  orthographic: 0\n  orthographic size: 5\n  m_Depth: -1\n  m_CullingMask:\n    serializedVersion: 2\n    m_Bits: 4294967295\n  m_RenderingPath: -1\n  m_TargetTexture: {{fileID: 0}}\n  m_TargetDisplay: 0\n  m_TargetEye: 3\n  m_HDR: 1\n  m_AllowMSAA: 1\n  m_AllowDynamicResolution: 0\n  m_ForceIntoRT: 0\n  m_OcclusionCulling: 1\n  m_StereoConvergence: 10\n  m_StereoSeparation: 0.022\n"
        ),
        SPRITE_RENDERER => format!(
            "SpriteRenderer:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {{fileID: 0}}\n  m_PrefabInstance: {{fileID: 0}}\n  m_PrefabAsset: {{fileID: 0}}\n  m_GameObject: {{fileID: {go_id}}}\n  m_Enabled: 1\n  m_CastShadows: 0\n  m_ReceiveShadows: 0\n  m_DynamicOccludee: 1\n  m_MotionVectors: 1\n  m_LightProbeUsage: 1\n  m_ReflectionProbeUsage: 1\n  m_RenderingLayerMask: 1\n  m_Materials:\n  - {{fileID: 10754, guid: 0000000000000000f000000000000000, type: 0}}\n  m_Color: {{r: 1, g: 1, b: 1, a: 1}}\n  m_FlipX: 0\n  m_FlipY: 0\n  m_Sprite: {{fileID: 0}}\n  m_SortingLayerID: 0\n  m_SortingLayer: 0\n  m_SortingOrder: 0\n"
        ),
        _ => return None,
    };
    Some(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(is_hierarchy_provider(TRANSFORM));
        assert!(is_hierarchy_provider(RECT_TRANSFORM));
        assert!(!is_hierarchy_provider(MONO_BEHAVIOUR));
        assert!(is_script_container(MONO_BEHAVIOUR));
        assert!(!is_script_container(TRANSFORM));
    }

    #[test]
    fn test_name_id_round_trip() {
        assert_eq!(class_id_of("BoxCollider"), Some(65));
        assert_eq!(class_name_of(65), Some("BoxCollider"));
        assert_eq!(class_id_of("NotAClass"), None);
        assert!(is_builtin_class_name("Rigidbody"));
        assert!(!is_builtin_class_name("PlayerController"));
    }

    #[test]
    fn test_default_body_wires_game_object() {
        let body = default_component_body(RIGIDBODY, "4242").unwrap();
        assert!(body.starts_with("Rigidbody:\n"));
        assert!(body.contains("m_GameObject: {fileID: 4242}"));
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn test_no_default_body_for_core_classes() {
        assert!(default_component_body(GAME_OBJECT, "1").is_none());
        assert!(default_component_body(TRANSFORM, "1").is_none());
        assert!(default_component_body(MONO_BEHAVIOUR, "1").is_none());
    }
}
