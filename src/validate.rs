//! Input validation shared by the operations: names, GUIDs, vectors, and
//! file-path policy.

use std::sync::LazyLock;

use regex::Regex;

use crate::common::{EngineError, Result};

static GUID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{32}$").expect("Invalid regex"));

const FORBIDDEN_NAME_CHARS: &[char] = &['/', '\\', '\n', '\r', '\t', '\0'];

/// Reject names containing path separators or control characters.
pub fn validate_name(value: &str, label: &str) -> Result<()> {
    if let Some(c) = value.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(EngineError::policy(format!(
            "{label} contains forbidden character {c:?}"
        )));
    }
    Ok(())
}

/// A Unity asset GUID is exactly 32 lowercase hex characters.
pub fn validate_guid(value: &str) -> Result<()> {
    if GUID_RE.is_match(value) {
        Ok(())
    } else {
        Err(EngineError::policy(format!(
            "invalid guid '{value}': expected 32 lowercase hex characters"
        )))
    }
}

/// All three axes must be finite.
pub fn validate_vector3(v: (f64, f64, f64), label: &str) -> Result<()> {
    for (axis, value) in [("x", v.0), ("y", v.1), ("z", v.2)] {
        if !value.is_finite() {
            return Err(EngineError::policy(format!(
                "{label}.{axis} is not a finite number: {value}"
            )));
        }
    }
    Ok(())
}

/// File access mode for path policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMode {
    Read,
    Write,
}

/// Reject URL-ish paths, relative traversal, and writes into the read-only
/// `Packages/` tree.
pub fn validate_file_path(path: &str, mode: PathMode) -> Result<()> {
    if path.starts_with("file://") {
        return Err(EngineError::policy(format!(
            "file:// URLs are not accepted: {path}"
        )));
    }
    let is_absolute = path.starts_with('/') || path.chars().nth(1) == Some(':');
    if !is_absolute {
        let traverses = path
            .split(['/', '\\'])
            .any(|segment| segment == "..");
        if traverses {
            return Err(EngineError::policy(format!(
                "relative path escapes its base directory: {path}"
            )));
        }
        if mode == PathMode::Write
            && (path.starts_with("Packages/") || path.starts_with("Packages\\"))
        {
            return Err(EngineError::policy(format!(
                "Packages/ is read-only; cannot write {path}"
            )));
        }
    }
    Ok(())
}
