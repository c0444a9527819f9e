//! The resource catalog: a deduplicated, score-gated registry keyed by
//! resource id.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use trainingcatalog_shared::text::sha256_hex;
use trainingcatalog_shared::{Resource, Result, SkillDomain, TrainingCatalogError};

use crate::{read_json, write_json_atomic};

/// On-disk shape of the catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub resources: BTreeMap<String, Resource>,
}

/// Result of [`CatalogStore::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First sighting of this id.
    Inserted,
    /// Merged into an existing record.
    Updated,
    /// Scored below the admission threshold and dropped.
    Rejected,
}

impl UpsertOutcome {
    pub fn is_accepted(self) -> bool {
        self != Self::Rejected
    }
}

type Index = BTreeMap<String, Resource>;

/// JSON-backed catalog with a lazily loaded in-memory index.
///
/// All reads and writes are serialized through one lock; writes go straight
/// through to disk before the call returns. Share it across tasks with `Arc`.
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
    index: Mutex<Option<Index>>,
}

impl CatalogStore {
    /// Create a store backed by `path`. Nothing is read until first use.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            index: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lock the index, loading it from disk the first time.
    async fn lock(&self) -> Result<MutexGuard<'_, Option<Index>>> {
        let mut guard = self.index.lock().await;
        if guard.is_none() {
            let doc: CatalogDocument = read_json(&self.path)?.unwrap_or_default();
            debug!(path = %self.path.display(), resources = doc.resources.len(), "catalog loaded");
            *guard = Some(doc.resources);
        }
        Ok(guard)
    }

    fn persist(&self, index: &Index) -> Result<()> {
        #[derive(Serialize)]
        struct DocumentRef<'a> {
            resources: &'a Index,
        }
        write_json_atomic(&self.path, &DocumentRef { resources: index })
    }

    /// Insert or merge a resource.
    ///
    /// Resources below `min_score` are rejected. An existing record keeps its
    /// `discovered_at` and the higher of the two scores; everything else comes
    /// from the incoming resource.
    pub async fn upsert(&self, resource: Resource, min_score: f64) -> Result<UpsertOutcome> {
        if resource.quality_score < min_score {
            debug!(id = %resource.id, score = resource.quality_score, min_score, "below threshold");
            return Ok(UpsertOutcome::Rejected);
        }

        let mut guard = self.lock().await?;
        let index = guard.get_or_insert_with(Index::new);

        let mut resource = resource;
        let outcome = match index.get(&resource.id) {
            Some(existing) => {
                resource.quality_score = resource.quality_score.max(existing.quality_score);
                resource.discovered_at = existing.discovered_at;
                UpsertOutcome::Updated
            }
            None => UpsertOutcome::Inserted,
        };

        let id = resource.id.clone();
        let previous = index.insert(id.clone(), resource);
        if let Err(e) = self.persist(index) {
            // Keep memory consistent with disk.
            match previous {
                Some(old) => index.insert(id, old),
                None => index.remove(&id),
            };
            return Err(e);
        }
        Ok(outcome)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Resource>> {
        let guard = self.lock().await?;
        Ok(guard.as_ref().and_then(|idx| idx.get(id).cloned()))
    }

    /// Every resource scoring at least `min_score`, best first.
    pub async fn get_all(&self, min_score: f64) -> Result<Vec<Resource>> {
        let guard = self.lock().await?;
        let mut all: Vec<Resource> = guard
            .iter()
            .flat_map(|idx| idx.values())
            .filter(|r| r.quality_score >= min_score)
            .cloned()
            .collect();
        sort_by_score(&mut all);
        Ok(all)
    }

    /// Resources tagged with `domain` (in any position), best first.
    pub async fn get_by_domain(&self, domain: SkillDomain) -> Result<Vec<Resource>> {
        let guard = self.lock().await?;
        let mut hits: Vec<Resource> = guard
            .iter()
            .flat_map(|idx| idx.values())
            .filter(|r| r.domains.contains(&domain))
            .cloned()
            .collect();
        sort_by_score(&mut hits);
        Ok(hits)
    }

    pub async fn count(&self) -> Result<usize> {
        let guard = self.lock().await?;
        Ok(guard.as_ref().map_or(0, BTreeMap::len))
    }

    /// Remove a resource. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut guard = self.lock().await?;
        let index = guard.get_or_insert_with(Index::new);
        let Some(removed) = index.remove(id) else {
            return Ok(false);
        };
        if let Err(e) = self.persist(index) {
            index.insert(id.to_string(), removed);
            return Err(e);
        }
        info!(id, "resource deleted");
        Ok(true)
    }

    /// Fingerprint of the full catalog content: first 16 hex chars of
    /// SHA-256 over its canonical JSON.
    pub async fn catalog_hash(&self) -> Result<String> {
        let guard = self.lock().await?;
        let empty = Index::new();
        let index = guard.as_ref().unwrap_or(&empty);
        let canonical = serde_json::to_string(index)
            .map_err(|e| TrainingCatalogError::Storage(format!("serialize catalog: {e}")))?;
        let mut hash = sha256_hex(&canonical);
        hash.truncate(16);
        Ok(hash)
    }

    /// Write a copy of the catalog document to `dest`. Returns the number of
    /// resources written.
    pub async fn export(&self, dest: &Path) -> Result<usize> {
        let guard = self.lock().await?;
        let empty = Index::new();
        let index = guard.as_ref().unwrap_or(&empty);
        write_json_atomic(
            dest,
            &CatalogDocument {
                resources: index.clone(),
            },
        )?;
        info!(dest = %dest.display(), resources = index.len(), "catalog exported");
        Ok(index.len())
    }
}

/// Score descending; ties keep id order.
fn sort_by_score(resources: &mut [Resource]) {
    resources.sort_by(|a, b| b.quality_score.total_cmp(&a.quality_score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn temp_catalog() -> (PathBuf, CatalogStore) {
        let dir = std::env::temp_dir().join(format!("atc-catalog-{}", Uuid::now_v7()));
        let store = CatalogStore::open(dir.join("catalog.json"));
        (dir, store)
    }

    fn resource(url: &str, score: f64) -> Resource {
        let mut r = Resource::new(url, format!("Title for {url}"));
        r.quality_score = score;
        r
    }

    #[tokio::test]
    async fn upsert_keeps_max_score_and_first_sighting() {
        let (dir, store) = temp_catalog();

        let mut first = resource("https://example.com/course", 0.5);
        first.discovered_at = Utc::now() - Duration::days(10);
        let first_seen = first.discovered_at;
        assert_eq!(store.upsert(first, 0.3).await.unwrap(), UpsertOutcome::Inserted);

        let second = resource("https://EXAMPLE.com/course/", 0.7);
        assert_eq!(store.upsert(second, 0.3).await.unwrap(), UpsertOutcome::Updated);

        let lower = resource("https://example.com/course", 0.4);
        assert_eq!(store.upsert(lower, 0.3).await.unwrap(), UpsertOutcome::Updated);

        assert_eq!(store.count().await.unwrap(), 1);
        let all = store.get_all(0.0).await.unwrap();
        assert_eq!(all[0].quality_score, 0.7);
        assert_eq!(all[0].discovered_at, first_seen);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn below_threshold_is_rejected() {
        let (dir, store) = temp_catalog();
        let outcome = store.upsert(resource("https://e.org/a", 0.1), 0.3).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Rejected);
        assert!(!outcome.is_accepted());
        assert_eq!(store.count().await.unwrap(), 0);
        // Nothing was written.
        assert!(!dir.join("catalog.json").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn persists_across_instances() {
        let (dir, store) = temp_catalog();
        let mut r = resource("https://e.org/a", 0.9);
        r.domains = vec![SkillDomain::Nlp];
        r.tags = vec!["sentiment analysis".into()];
        let id = r.id.clone();
        store.upsert(r.clone(), 0.0).await.unwrap();

        let reopened = CatalogStore::open(store.path());
        let loaded = reopened.get(&id).await.unwrap().unwrap();
        assert_eq!(loaded, r);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"resources\""));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn queries_sort_and_filter() {
        let (dir, store) = temp_catalog();
        let mut a = resource("https://e.org/a", 0.4);
        a.domains = vec![SkillDomain::MlBasics];
        let mut b = resource("https://e.org/b", 0.9);
        b.domains = vec![SkillDomain::DeepLearning, SkillDomain::MlBasics];
        let c = resource("https://e.org/c", 0.6);
        for r in [a, b, c] {
            store.upsert(r, 0.0).await.unwrap();
        }

        let scores: Vec<f64> = store.get_all(0.5).await.unwrap().iter().map(|r| r.quality_score).collect();
        assert_eq!(scores, vec![0.9, 0.6]);

        let ml = store.get_by_domain(SkillDomain::MlBasics).await.unwrap();
        assert_eq!(ml.len(), 2);
        assert_eq!(ml[0].quality_score, 0.9);
        assert!(store.get_by_domain(SkillDomain::AiRoi).await.unwrap().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn delete_and_hash() {
        let (dir, store) = temp_catalog();
        let empty_hash = store.catalog_hash().await.unwrap();
        assert_eq!(empty_hash.len(), 16);

        let r = resource("https://e.org/a", 0.5);
        let id = r.id.clone();
        store.upsert(r, 0.0).await.unwrap();
        let full_hash = store.catalog_hash().await.unwrap();
        assert_ne!(empty_hash, full_hash);
        assert_eq!(full_hash, store.catalog_hash().await.unwrap());

        assert!(store.delete(&id).await.unwrap());
        assert!(!store.delete(&id).await.unwrap());
        assert_eq!(store.catalog_hash().await.unwrap(), empty_hash);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn export_writes_full_document() {
        let (dir, store) = temp_catalog();
        store.upsert(resource("https://e.org/a", 0.5), 0.0).await.unwrap();
        store.upsert(resource("https://e.org/b", 0.6), 0.0).await.unwrap();

        let dest = dir.join("export").join("copy.json");
        assert_eq!(store.export(&dest).await.unwrap(), 2);
        let doc: CatalogDocument = read_json(&dest).unwrap().unwrap();
        assert_eq!(doc.resources.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let (dir, store) = temp_catalog();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(store.path(), "not json").unwrap();
        let err = store.count().await.unwrap_err();
        assert!(matches!(err, TrainingCatalogError::Storage(_)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn concurrent_upserts_are_all_recorded() {
        let (dir, store) = temp_catalog();
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert(resource(&format!("https://e.org/{i}"), 0.5), 0.0)
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), UpsertOutcome::Inserted);
        }

        let reopened = CatalogStore::open(store.path());
        assert_eq!(reopened.count().await.unwrap(), 20);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
