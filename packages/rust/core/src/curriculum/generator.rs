//! Catalog → curriculum generation.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use trainingcatalog_shared::{
    Curriculum, CurriculumMetadata, Resource, Result, Settings, SkillDomain, ValidationReport,
};
use trainingcatalog_storage::{CatalogStore, CurriculumStore, write_json_atomic};

use super::best_practices::BestPracticesEngine;
use super::learning_path::LearningPathBuilder;

/// Builds, persists and validates curricula from the catalog.
pub struct CurriculumGenerator {
    catalog: Arc<CatalogStore>,
    store: CurriculumStore,
    builder: LearningPathBuilder,
    engine: BestPracticesEngine,
    min_quality_score: f64,
}

impl CurriculumGenerator {
    pub fn new(settings: &Settings, catalog: Arc<CatalogStore>, store: CurriculumStore) -> Self {
        Self {
            catalog,
            store,
            builder: LearningPathBuilder::from(settings),
            engine: BestPracticesEngine::from(settings),
            min_quality_score: settings.min_quality_score,
        }
    }

    /// Generate a curriculum for `domains` (every domain when empty).
    ///
    /// The curriculum is saved to the curriculum store, and additionally to
    /// `output` when given, before validation runs.
    #[instrument(skip_all, fields(domains = domains.len()))]
    pub async fn generate(
        &self,
        domains: &[SkillDomain],
        title: Option<&str>,
        output: Option<&Path>,
    ) -> Result<(Curriculum, ValidationReport)> {
        let resources: Vec<Resource> = self
            .catalog
            .get_all(self.min_quality_score)
            .await?
            .into_iter()
            .filter(|r| r.is_active)
            .filter(|r| domains.is_empty() || r.domains.iter().any(|d| domains.contains(d)))
            .collect();
        info!(resources = resources.len(), "generating curriculum");

        // Primary domain → resources, in domain-name order.
        let mut by_domain: BTreeMap<&'static str, (SkillDomain, Vec<Resource>)> = BTreeMap::new();
        for r in &resources {
            if let Some(primary) = r.primary_domain() {
                by_domain
                    .entry(primary.as_str())
                    .or_insert_with(|| (primary, Vec::new()))
                    .1
                    .push(r.clone());
            }
        }

        let mut learning_paths = Vec::new();
        for (domain, domain_resources) in by_domain.values() {
            if !domains.is_empty() && !domains.contains(domain) {
                continue;
            }
            let paths = self.builder.build(*domain, domain_resources);
            info!(
                domain = %domain,
                paths = paths.len(),
                resources = domain_resources.len(),
                "built learning paths"
            );
            learning_paths.extend(paths);
        }

        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| default_title(domains));
        let catalog_hash = self.catalog.catalog_hash().await?;

        let curriculum = Curriculum {
            id: Curriculum::stable_id(&title, &catalog_hash),
            description: format!(
                "Auto-generated curriculum with {} learning paths covering {} skill domains, \
                 built from {} curated free and open-source resources.",
                learning_paths.len(),
                by_domain.len(),
                resources.len()
            ),
            title,
            metadata: CurriculumMetadata {
                domains_covered: by_domain.values().map(|(d, _)| *d).collect(),
                total_resources: resources.len(),
                total_paths: learning_paths.len(),
            },
            learning_paths,
            generated_at: Utc::now(),
            source_catalog_hash: catalog_hash,
        };

        self.store.save(&curriculum)?;
        if let Some(output) = output {
            write_json_atomic(output, &curriculum)?;
            info!(path = %output.display(), "curriculum written");
        }

        let lookup: HashMap<String, Resource> =
            resources.into_iter().map(|r| (r.id.clone(), r)).collect();
        let report = self.engine.validate(&curriculum, &lookup);
        if report.error_count() > 0 {
            warn!(
                errors = report.error_count(),
                warnings = report.warning_count(),
                "curriculum has validation errors"
            );
        } else {
            info!(
                warnings = report.warning_count(),
                info = report.info_count(),
                "curriculum validated"
            );
        }

        Ok((curriculum, report))
    }
}

/// `AI {Categories} Best Practices Curriculum` for an explicit domain set,
/// otherwise the comprehensive title.
pub fn default_title(domains: &[SkillDomain]) -> String {
    if domains.is_empty() {
        return "Comprehensive AI Best Practices Curriculum".to_string();
    }
    let categories: BTreeSet<&str> = domains.iter().map(|d| d.category().title()).collect();
    format!(
        "AI {} Best Practices Curriculum",
        categories.into_iter().collect::<Vec<_>>().join(" & ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use trainingcatalog_shared::{ContentType, DifficultyLevel};
    use uuid::Uuid;

    struct Fixture {
        dir: PathBuf,
        settings: Settings,
        catalog: Arc<CatalogStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("atc-generator-{}", Uuid::now_v7()));
            let settings = Settings::default().with_data_dir(&dir);
            let catalog = Arc::new(CatalogStore::open(&settings.catalog_path));
            Self {
                dir,
                settings,
                catalog,
            }
        }

        fn generator(&self) -> CurriculumGenerator {
            CurriculumGenerator::new(
                &self.settings,
                self.catalog.clone(),
                CurriculumStore::open(&self.settings.curricula_dir),
            )
        }

        async fn add(&self, n: usize, domains: &[SkillDomain], difficulty: DifficultyLevel) {
            let mut r = Resource::new(format!("https://example.com/r{n}"), format!("Resource {n}"));
            r.domains = domains.to_vec();
            r.difficulty = difficulty;
            r.provider = format!("provider{n}");
            r.content_type = ContentType::Course;
            r.quality_score = 0.5 + n as f64 / 100.0;
            self.catalog.upsert(r, 0.0).await.unwrap();
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    #[test]
    fn titles() {
        assert_eq!(default_title(&[]), "Comprehensive AI Best Practices Curriculum");
        assert_eq!(
            default_title(&[SkillDomain::Nlp, SkillDomain::MlBasics]),
            "AI Technical Best Practices Curriculum"
        );
        assert_eq!(
            default_title(&[SkillDomain::AiRoi, SkillDomain::Nlp]),
            "AI Business & Technical Best Practices Curriculum"
        );
    }

    #[tokio::test]
    async fn generates_persists_and_validates() {
        let fx = Fixture::new();
        fx.add(1, &[SkillDomain::Nlp], DifficultyLevel::Beginner).await;
        fx.add(2, &[SkillDomain::Nlp], DifficultyLevel::Intermediate).await;
        fx.add(3, &[SkillDomain::MlBasics], DifficultyLevel::Beginner).await;
        fx.add(4, &[SkillDomain::AiEthics, SkillDomain::Nlp], DifficultyLevel::Beginner).await;

        let output = fx.dir.join("out").join("curriculum.json");
        let (curriculum, report) = fx
            .generator()
            .generate(&[], None, Some(&output))
            .await
            .unwrap();

        assert_eq!(curriculum.title, "Comprehensive AI Best Practices Curriculum");
        assert_eq!(curriculum.metadata.total_resources, 4);
        assert_eq!(curriculum.metadata.total_paths, 4);
        // Domain-name order: ai_ethics, ml_basics, nlp.
        assert_eq!(
            curriculum.metadata.domains_covered,
            vec![SkillDomain::AiEthics, SkillDomain::MlBasics, SkillDomain::Nlp]
        );
        assert_eq!(curriculum.learning_paths[0].domains, vec![SkillDomain::AiEthics]);
        assert_eq!(curriculum.learning_paths[3].difficulty, DifficultyLevel::Intermediate);

        let hash = fx.catalog.catalog_hash().await.unwrap();
        assert_eq!(curriculum.id, Curriculum::stable_id(&curriculum.title, &hash));

        let store = CurriculumStore::open(&fx.settings.curricula_dir);
        assert_eq!(store.load(&curriculum.id).unwrap(), curriculum);
        assert!(output.exists());

        // ai_ethics is a business domain without case-study content.
        assert_eq!(report.by_rule("business_needs_cases").count(), 1);
    }

    #[tokio::test]
    async fn filters_to_requested_domains_and_skips_inactive() {
        let fx = Fixture::new();
        fx.add(1, &[SkillDomain::Nlp], DifficultyLevel::Beginner).await;
        fx.add(2, &[SkillDomain::MlBasics, SkillDomain::Nlp], DifficultyLevel::Beginner).await;
        fx.add(3, &[SkillDomain::ComputerVision], DifficultyLevel::Beginner).await;

        let mut inactive = Resource::new("https://example.com/dup", "dup");
        inactive.domains = vec![SkillDomain::Nlp];
        inactive.quality_score = 0.9;
        inactive.is_active = false;
        fx.catalog.upsert(inactive, 0.0).await.unwrap();

        let (curriculum, _) = fx
            .generator()
            .generate(&[SkillDomain::Nlp], Some("NLP Track"), None)
            .await
            .unwrap();

        assert_eq!(curriculum.title, "NLP Track");
        // r2 overlaps on nlp but its primary is ml_basics: grouped, not built.
        assert_eq!(curriculum.metadata.total_resources, 2);
        assert_eq!(
            curriculum.metadata.domains_covered,
            vec![SkillDomain::MlBasics, SkillDomain::Nlp]
        );
        assert_eq!(curriculum.learning_paths.len(), 1);
        assert_eq!(curriculum.learning_paths[0].resource_ids().count(), 1);
    }

    #[tokio::test]
    async fn empty_catalog_still_produces_a_curriculum() {
        let fx = Fixture::new();
        let (curriculum, report) = fx.generator().generate(&[], None, None).await.unwrap();
        assert!(curriculum.learning_paths.is_empty());
        assert!(report.issues.is_empty());
    }
}
