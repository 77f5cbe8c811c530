use thiserror::Error;

/// Errors surfaced by document loading, editing, and persistence.
///
/// Every variant carries enough context to point the caller at the file and
/// the identifier that failed; remediation hints ride in the message where a
/// known fix exists.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Read, write, or rename failure on the file system.
    #[error("cannot access {path}: {source}")]
    FileAccess {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Missing header, truncated block, or a block header that does not
    /// match `--- !u!<class> &<fileID>`.
    #[error("malformed document: {detail}")]
    MalformedDocument { detail: String },

    /// A file id, name, parent, or source prefab could not be resolved.
    #[error("{what} not found: {ident}{}", fmt_hint(.hint))]
    NotFound {
        what: String,
        ident: String,
        hint: Option<String>,
    },

    /// Several GameObjects share the requested name; the message lists every
    /// colliding file id so the caller can retry with one of them.
    #[error("multiple GameObjects named '{name}' (fileIDs: {}); retry with a fileID", .candidates.join(", "))]
    AmbiguousName {
        name: String,
        candidates: Vec<String>,
    },

    /// The supplied value's shape does not match the property's serialized
    /// shape.
    #[error("type mismatch for '{property}': {detail}")]
    TypeMismatch { property: String, detail: String },

    /// Post-edit document validation rejected the result.
    #[error("document validation failed: {detail}")]
    ValidationFailed { detail: String },

    /// The operation is structurally forbidden (removing a GameObject via
    /// component removal, cloning a Transform, writing under Packages/, ...).
    #[error("{0}")]
    PolicyViolation(String),

    /// The reparent would make a Transform its own ancestor.
    #[error("cannot parent {child} under {ancestor}: {ancestor} is a descendant of {child}")]
    CircularHierarchy { child: String, ancestor: String },

    /// A create operation targets a path that already exists.
    #[error("{path} already exists")]
    AlreadyExists { path: String },

    /// A required external resolver or input was not supplied.
    #[error("{what} unavailable: {hint}")]
    Unavailable { what: String, hint: String },
}

fn fmt_hint(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!(" ({h})"),
        None => String::new(),
    }
}

impl EngineError {
    pub fn file_access(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        EngineError::FileAccess {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        EngineError::MalformedDocument {
            detail: detail.into(),
        }
    }

    pub fn not_found(what: impl Into<String>, ident: impl Into<String>) -> Self {
        EngineError::NotFound {
            what: what.into(),
            ident: ident.into(),
            hint: None,
        }
    }

    pub fn not_found_hint(
        what: impl Into<String>,
        ident: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        EngineError::NotFound {
            what: what.into(),
            ident: ident.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn policy(detail: impl Into<String>) -> Self {
        EngineError::PolicyViolation(detail.into())
    }

    pub fn type_mismatch(property: impl Into<String>, detail: impl Into<String>) -> Self {
        EngineError::TypeMismatch {
            property: property.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
