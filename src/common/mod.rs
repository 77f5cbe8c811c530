pub mod error;
pub mod types;

pub use error::{EngineError, Result};
pub use types::*;

use std::fs;
use std::path::Path;

/// Read a Unity file from disk and normalize line endings (CRLF → LF).
///
/// All Unity YAML parsing depends on LF-only content — regex patterns use
/// literal \n for block header matching, and indentation walks split on '\n'.
pub fn read_unity_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let content = fs::read_to_string(path.as_ref())
        .map_err(|e| EngineError::file_access(path.as_ref(), e))?;
    if content.contains('\r') {
        Ok(content.replace("\r\n", "\n"))
    } else {
        Ok(content)
    }
}

/// Generate a fresh asset GUID: 32 lowercase hex characters.
pub fn generate_guid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Draw a candidate local file id in the 10-digit decimal range Unity uses
/// for editor-created objects. Uniqueness against a document is the caller's
/// concern.
pub fn random_file_id() -> String {
    let bits = uuid::Uuid::new_v4().as_u128();
    let id = 1_000_000_000u64 + (bits % 9_000_000_000u128) as u64;
    id.to_string()
}
