use serde::{Deserialize, Serialize};

/// Basic GameObject information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameObjectInfo {
    pub name: String,
    pub file_id: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
}

/// Component information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentInfo {
    #[serde(rename = "type")]
    pub type_name: String,
    pub class_id: u32,
    pub file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_guid: Option<String>,
}

/// GameObject with hierarchy and component details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameObjectDetail {
    pub name: String,
    pub file_id: String,
    pub active: bool,
    pub tag: String,
    pub layer: u32,
    pub components: Vec<ComponentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_transform_id: Option<String>,
}

/// PrefabInstance summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefabInstanceInfo {
    pub name: String,
    pub file_id: String,
    pub source_guid: String,
    pub modifications_count: u32,
}

/// Union result from name search: either a GameObject or a PrefabInstance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindResult {
    pub name: String,
    pub file_id: String,
    pub result_type: String, // "GameObject" or "PrefabInstance"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_guid: Option<String>,
}

impl FindResult {
    pub fn from_game_object(go: &GameObjectInfo, score: Option<f64>) -> Self {
        FindResult {
            name: go.name.clone(),
            file_id: go.file_id.clone(),
            result_type: "GameObject".to_string(),
            active: Some(go.active),
            match_score: score,
            source_guid: None,
        }
    }

    pub fn from_prefab_instance(pi: &PrefabInstanceInfo, score: Option<f64>) -> Self {
        FindResult {
            name: pi.name.clone(),
            file_id: pi.file_id.clone(),
            result_type: "PrefabInstance".to_string(),
            active: None,
            match_score: score,
            source_guid: Some(pi.source_guid.clone()),
        }
    }
}

// --- Operation reports ---
//
// Every mutating operation returns one of these. Warnings ride on the
// report; they are never promoted to errors.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGameObjectReport {
    pub file: String,
    pub go_id: String,
    pub transform_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefab_instance_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSceneReport {
    pub scene_path: String,
    pub meta_path: String,
    pub scene_guid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrefabVariantReport {
    pub prefab_path: String,
    pub meta_path: String,
    pub source_guid: String,
    pub prefab_instance_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScriptableObjectReport {
    pub asset_path: String,
    pub meta_path: String,
    pub script_guid: String,
    pub asset_guid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMetaReport {
    pub meta_path: String,
    pub guid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddComponentReport {
    pub component_id: String,
    pub class_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyComponentReport {
    pub new_component_id: String,
    pub class_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditReport {
    pub file: String,
    pub bytes_written: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditComponentReport {
    pub class_id: u32,
    pub bytes_written: u64,
}

/// What happened to a prefab override entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideAction {
    Added,
    Updated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditOverrideReport {
    pub action: OverrideAction,
    pub property_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReparentReport {
    pub old_parent_id: String,
    pub new_parent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveComponentReport {
    pub removed_class_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteReport {
    pub deleted_count: usize,
}

/// One old-id → new-id pair from a duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClonedObject {
    pub old_id: String,
    pub new_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub new_go_id: String,
    pub new_transform_id: String,
    pub total_duplicated: usize,
    pub cloned_objects: Vec<ClonedObject>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnpackReport {
    pub unpacked_count: usize,
    pub new_root_go_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEditReport {
    pub file: String,
    pub applied: usize,
    pub bytes_written: u64,
}
