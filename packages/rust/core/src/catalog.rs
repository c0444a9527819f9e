//! Read-side catalog operations: listing, statistics and export.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use trainingcatalog_shared::{Resource, Result, SkillDomain};
use trainingcatalog_storage::CatalogStore;

/// One page of catalog resources plus the number of matches overall.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogListing {
    pub total_matches: usize,
    pub resources: Vec<Resource>,
}

/// List resources tagged with `domain`, or every resource scoring at least
/// `min_score` when no domain is given. Best first, at most `limit`.
pub async fn list(
    catalog: &CatalogStore,
    domain: Option<SkillDomain>,
    min_score: f64,
    limit: usize,
) -> Result<CatalogListing> {
    let mut resources = match domain {
        Some(domain) => catalog.get_by_domain(domain).await?,
        None => catalog.get_all(min_score).await?,
    };
    let total_matches = resources.len();
    resources.truncate(limit);
    Ok(CatalogListing {
        total_matches,
        resources,
    })
}

/// Aggregate numbers over the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub active: usize,
    pub average_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    /// Every domain a resource carries counts once.
    pub by_domain: Vec<(String, usize)>,
    pub by_content_type: Vec<(String, usize)>,
    /// Empty providers are reported as `unknown`.
    pub by_provider: Vec<(String, usize)>,
}

pub async fn stats(catalog: &CatalogStore) -> Result<CatalogStats> {
    let resources = catalog.get_all(0.0).await?;
    if resources.is_empty() {
        return Ok(CatalogStats::default());
    }

    let mut by_domain: HashMap<String, usize> = HashMap::new();
    let mut by_type: HashMap<String, usize> = HashMap::new();
    let mut by_provider: HashMap<String, usize> = HashMap::new();
    for r in &resources {
        for d in &r.domains {
            *by_domain.entry(d.as_str().to_string()).or_default() += 1;
        }
        *by_type.entry(r.content_type.as_str().to_string()).or_default() += 1;
        let provider = if r.provider.is_empty() { "unknown" } else { r.provider.as_str() };
        *by_provider.entry(provider.to_string()).or_default() += 1;
    }

    let scores = resources.iter().map(|r| r.quality_score);
    Ok(CatalogStats {
        total: resources.len(),
        active: resources.iter().filter(|r| r.is_active).count(),
        average_score: scores.clone().sum::<f64>() / resources.len() as f64,
        min_score: scores.clone().fold(f64::INFINITY, f64::min),
        max_score: scores.fold(f64::NEG_INFINITY, f64::max),
        by_domain: ranked(by_domain),
        by_content_type: ranked(by_type),
        by_provider: ranked(by_provider),
    })
}

/// Write the catalog document to `dest`, returning the resource count.
pub async fn export(catalog: &CatalogStore, dest: &Path) -> Result<usize> {
    catalog.export(dest).await
}

/// Count descending, then name ascending.
fn ranked(counts: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use trainingcatalog_shared::ContentType;
    use uuid::Uuid;

    async fn seeded() -> (std::path::PathBuf, CatalogStore) {
        let dir = std::env::temp_dir().join(format!("atc-catalog-ops-{}", Uuid::now_v7()));
        let store = CatalogStore::open(dir.join("catalog.json"));
        let specs = [
            ("a", 0.9, "mit", vec![SkillDomain::MlBasics], ContentType::Course, true),
            ("b", 0.6, "", vec![SkillDomain::MlBasics, SkillDomain::Nlp], ContentType::Tutorial, true),
            ("c", 0.3, "mit", vec![SkillDomain::Nlp], ContentType::Course, false),
        ];
        for (name, score, provider, domains, content_type, active) in specs {
            let mut r = Resource::new(format!("https://example.com/{name}"), name);
            r.quality_score = score;
            r.provider = provider.into();
            r.domains = domains;
            r.content_type = content_type;
            r.is_active = active;
            store.upsert(r, 0.0).await.unwrap();
        }
        (dir, store)
    }

    #[tokio::test]
    async fn list_by_score_and_domain() {
        let (dir, store) = seeded().await;

        let listing = list(&store, None, 0.5, 1).await.unwrap();
        assert_eq!(listing.total_matches, 2);
        assert_eq!(listing.resources.len(), 1);
        assert_eq!(listing.resources[0].title, "a");

        let listing = list(&store, Some(SkillDomain::Nlp), 0.99, 10).await.unwrap();
        let titles: Vec<&str> = listing.resources.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn stats_aggregate() {
        let (dir, store) = seeded().await;
        let s = stats(&store).await.unwrap();

        assert_eq!(s.total, 3);
        assert_eq!(s.active, 2);
        assert!((s.average_score - 0.6).abs() < 1e-9);
        assert_eq!(s.min_score, 0.3);
        assert_eq!(s.max_score, 0.9);
        assert_eq!(
            s.by_domain,
            vec![("ml_basics".to_string(), 2), ("nlp".to_string(), 2)]
        );
        assert_eq!(s.by_content_type[0], ("course".to_string(), 2));
        assert_eq!(
            s.by_provider,
            vec![("mit".to_string(), 2), ("unknown".to_string(), 1)]
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn empty_catalog_stats_and_export() {
        let dir = std::env::temp_dir().join(format!("atc-catalog-ops-{}", Uuid::now_v7()));
        let store = CatalogStore::open(dir.join("catalog.json"));
        assert_eq!(stats(&store).await.unwrap(), CatalogStats::default());

        let (seeded_dir, seeded_store) = seeded().await;
        let dest = dir.join("export.json");
        assert_eq!(export(&seeded_store, &dest).await.unwrap(), 3);
        assert!(dest.exists());

        let _ = std::fs::remove_dir_all(&dir);
        let _ = std::fs::remove_dir_all(&seeded_dir);
    }
}
