//! Caller-supplied resolver seams. The engine never walks a project tree
//! itself: GUID → path lookup, type-registry queries, and project settings
//! all arrive through these traits, which keeps the core deterministic and
//! the caller's caching policy pluggable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A serializable field extracted from a C# script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptField {
    pub name: String,
    pub type_name: String,
    pub has_serialize_field: bool,
    pub has_serialize_reference: bool,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_type: Option<String>,
}

/// What a script identifier resolved to: its GUID plus whatever the type
/// registry knows about the declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptInfo {
    pub guid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// "class", "struct", "enum", or "interface"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<ScriptField>>,
}

/// Resolves a script identifier — a raw 32-hex GUID, a `.cs` path, or a
/// (possibly namespace-qualified) type name — against the caller's registry.
pub trait ScriptResolver {
    fn resolve_script(&self, ident: &str, project_path: Option<&Path>) -> Option<ScriptInfo>;
}

/// Resolves a prefab GUID to an absolute path on disk.
pub trait PrefabResolver {
    fn resolve_prefab_by_guid(&self, guid: &str, project_path: Option<&Path>) -> Option<PathBuf>;
}

/// Reads project-level settings the engine cannot derive from one file.
pub trait ProjectSettingsSource {
    fn unity_version(&self, project_path: &Path) -> Option<UnityVersion>;
    fn tags(&self, project_path: &Path) -> Option<Vec<String>>;
}

/// A parsed `ProjectVersion.txt` entry such as `2022.3.10f1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnityVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub release_type: String,
    pub revision: u32,
}

impl UnityVersion {
    /// Parse `major.minor.patch<type><revision>`, tolerating a missing
    /// type/revision tail.
    pub fn parse(text: &str) -> Option<UnityVersion> {
        let text = text.trim();
        let mut parts = text.splitn(3, '.');
        let major: u32 = parts.next()?.parse().ok()?;
        let minor: u32 = parts.next()?.parse().ok()?;
        let tail = parts.next().unwrap_or("0");
        let digits_end = tail
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(tail.len());
        let patch: u32 = tail[..digits_end].parse().ok()?;
        let rest = &tail[digits_end..];
        let (release_type, revision) = if rest.is_empty() {
            (String::new(), 0)
        } else {
            let type_end = rest
                .find(|c: char| c.is_ascii_digit())
                .unwrap_or(rest.len());
            (
                rest[..type_end].to_string(),
                rest[type_end..].parse().unwrap_or(0),
            )
        };
        Some(UnityVersion {
            major,
            minor,
            patch,
            release_type,
            revision,
        })
    }

    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        self.major > major || (self.major == major && self.minor >= minor)
    }
}

impl std::fmt::Display for UnityVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.release_type.is_empty() {
            write!(f, "{}{}", self.release_type, self.revision)?;
        }
        Ok(())
    }
}
