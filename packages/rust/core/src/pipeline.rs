//! Operation entry points: discover, ingest and generate.
//!
//! Each entry point wires the components it needs from an immutable
//! [`Settings`] and reports its phases through a [`ProgressReporter`].

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use trainingcatalog_discovery::{DiscoveryAgent, DiscoveryReport, default_searchers};
use trainingcatalog_fetch::Fetcher;
use trainingcatalog_ingestion::ScraperRegistry;
use trainingcatalog_shared::{
    Credentials, Curriculum, Result, Settings, SkillDomain, ValidationReport,
};
use trainingcatalog_storage::{CatalogStore, CurriculumStore};

use crate::curriculum::CurriculumGenerator;
use crate::ingest::{IngestionPipeline, IngestionReport};

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when one unit of work (a search, a scrape) finishes.
    fn item_done(&self, label: &str, current: usize, total: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item_done(&self, _label: &str, _current: usize, _total: usize) {}
}

/// Search every provider for `domains` (all when empty) and feed the catalog.
///
/// `max_results` falls back to `settings.max_results_per_query`.
#[instrument(skip_all, fields(domains = domains.len()))]
pub async fn discover(
    settings: &Settings,
    credentials: &Credentials,
    domains: &[SkillDomain],
    max_results: Option<usize>,
    progress: &dyn ProgressReporter,
) -> Result<DiscoveryReport> {
    let start = Instant::now();

    progress.phase("Preparing searchers");
    let fetcher = Fetcher::new(settings)?;
    let searchers = default_searchers(&fetcher, credentials);
    let catalog = Arc::new(CatalogStore::open(&settings.catalog_path));
    info!(
        searchers = searchers.len(),
        catalog = %settings.catalog_path.display(),
        "discovery configured"
    );

    progress.phase("Searching providers");
    let agent = DiscoveryAgent::new(searchers, catalog, settings.min_quality_score);
    let report = agent
        .run(domains, max_results.unwrap_or(settings.max_results_per_query))
        .await;

    info!(
        new = report.new_resources,
        updated = report.updated_resources,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "discover complete"
    );
    Ok(report)
}

/// Scrape, dedup and categorize catalog resources.
///
/// `min_score` falls back to `settings.min_quality_score`; `resource_id`
/// restricts the run to one resource.
#[instrument(skip_all, fields(resource_id))]
pub async fn ingest(
    settings: &Settings,
    min_score: Option<f64>,
    resource_id: Option<&str>,
    progress: &dyn ProgressReporter,
) -> Result<IngestionReport> {
    progress.phase("Preparing scrapers");
    let fetcher = Fetcher::new(settings)?;
    let catalog = Arc::new(CatalogStore::open(&settings.catalog_path));
    let pipeline = IngestionPipeline::new(catalog, ScraperRegistry::new(fetcher));

    pipeline
        .run(
            min_score.unwrap_or(settings.min_quality_score),
            resource_id,
            progress,
        )
        .await
}

/// Build, save and validate a curriculum from the current catalog.
#[instrument(skip_all, fields(domains = domains.len()))]
pub async fn generate(
    settings: &Settings,
    domains: &[SkillDomain],
    title: Option<&str>,
    output: Option<&Path>,
    progress: &dyn ProgressReporter,
) -> Result<(Curriculum, ValidationReport)> {
    progress.phase("Generating curriculum");
    let catalog = Arc::new(CatalogStore::open(&settings.catalog_path));
    let store = CurriculumStore::open(&settings.curricula_dir);
    let generator = CurriculumGenerator::new(settings, catalog, store);
    let outcome = generator.generate(domains, title, output).await?;
    progress.phase("Curriculum validated");
    Ok(outcome)
}
