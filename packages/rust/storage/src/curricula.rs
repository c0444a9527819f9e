//! One JSON document per generated curriculum.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use trainingcatalog_shared::{Curriculum, Result, TrainingCatalogError};

use crate::{read_json, write_json_atomic};

/// Directory of curriculum documents named `{sanitized id}.json`.
#[derive(Debug, Clone)]
pub struct CurriculumStore {
    dir: PathBuf,
}

impl CurriculumStore {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds (or would hold) the curriculum with `id`.
    pub fn path_for(&self, id: &str) -> PathBuf {
        let safe = id.replace(['/', ' '], "_");
        self.dir.join(format!("{safe}.json"))
    }

    /// Persist a curriculum, replacing any previous document with the same id.
    pub fn save(&self, curriculum: &Curriculum) -> Result<PathBuf> {
        let path = self.path_for(&curriculum.id);
        write_json_atomic(&path, curriculum)?;
        info!(id = %curriculum.id, path = %path.display(), "curriculum saved");
        Ok(path)
    }

    pub fn load(&self, id: &str) -> Result<Curriculum> {
        let path = self.path_for(id);
        read_json(&path)?.ok_or_else(|| {
            TrainingCatalogError::Storage(format!("curriculum '{id}' not found at {}", path.display()))
        })
    }

    /// Ids of every stored curriculum, sorted.
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TrainingCatalogError::io(&self.dir, e)),
        };

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                if name.starts_with('.') {
                    return None;
                }
                name.strip_suffix(".json").map(str::to_string)
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// The stored curriculum with the newest `generated_at`, if any.
    ///
    /// Unreadable documents are skipped with a warning.
    pub fn latest(&self) -> Result<Option<Curriculum>> {
        let mut newest: Option<Curriculum> = None;
        for id in self.list_ids()? {
            let curriculum = match self.load(&id) {
                Ok(c) => c,
                Err(e) => {
                    warn!(id, error = %e, "skipping unreadable curriculum");
                    continue;
                }
            };
            if newest
                .as_ref()
                .is_none_or(|n| curriculum.generated_at > n.generated_at)
            {
                newest = Some(curriculum);
            }
        }
        Ok(newest)
    }
}
