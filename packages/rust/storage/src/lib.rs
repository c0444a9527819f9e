//! JSON file persistence for the catalog and generated curricula.
//!
//! - [`CatalogStore`]: one JSON document holding every [`Resource`](trainingcatalog_shared::Resource),
//!   cached in memory behind a single async lock
//! - [`CurriculumStore`]: one JSON document per curriculum
//!
//! Every write goes to a temporary file in the target directory and is then
//! renamed over the destination, so readers never observe a partial file.

mod catalog;
mod curricula;

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use trainingcatalog_shared::{Result, TrainingCatalogError};

pub use catalog::{CatalogDocument, CatalogStore, UpsertOutcome};
pub use curricula::CurriculumStore;

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
///
/// Parent directories are created as needed. On failure the temporary file
/// is removed and the destination is left untouched.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| TrainingCatalogError::Storage(format!("serialize {}: {e}", path.display())))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| TrainingCatalogError::io(dir, e))?;

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| TrainingCatalogError::Storage(format!("not a file path: {}", path.display())))?;
    let temp = dir.join(format!(".{filename}.{}.tmp", Uuid::now_v7()));

    let written = std::fs::write(&temp, json.as_bytes())
        .map_err(|e| TrainingCatalogError::io(&temp, e))
        .and_then(|()| std::fs::rename(&temp, path).map_err(|e| TrainingCatalogError::io(path, e)));

    if written.is_err() {
        let _ = std::fs::remove_file(&temp);
    }
    written
}

/// Read and decode a JSON file. `Ok(None)` when the file does not exist or is
/// blank.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(TrainingCatalogError::io(path, e)),
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| TrainingCatalogError::Storage(format!("corrupt JSON in {}: {e}", path.display())))
}
