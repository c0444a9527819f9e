//! Ingestion pipeline: scrape → dedup → categorize → write back.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use trainingcatalog_ingestion::{Categorization, Categorizer, Deduplicator, ScraperRegistry};
use trainingcatalog_shared::text::round_to;
use trainingcatalog_shared::{Resource, Result, ScrapedContent};
use trainingcatalog_storage::CatalogStore;

use crate::pipeline::ProgressReporter;

/// Reading speed used for hour estimates, in words per minute.
const WORDS_PER_MINUTE: f64 = 200.0;

/// Exercises roughly double the reading time.
const PRACTICE_FACTOR: f64 = 2.0;

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionReport {
    pub total_resources: usize,
    pub scraped: usize,
    pub failed: usize,
    pub duplicate_groups: usize,
    pub duplicates_flagged: usize,
    pub recategorized: usize,
    pub errors: Vec<String>,
}

pub struct IngestionPipeline {
    catalog: Arc<CatalogStore>,
    scrapers: ScraperRegistry,
    deduplicator: Deduplicator,
    categorizer: Categorizer,
}

impl IngestionPipeline {
    pub fn new(catalog: Arc<CatalogStore>, scrapers: ScraperRegistry) -> Self {
        Self {
            catalog,
            scrapers,
            deduplicator: Deduplicator::default(),
            categorizer: Categorizer::default(),
        }
    }

    pub fn with_deduplicator(mut self, deduplicator: Deduplicator) -> Self {
        self.deduplicator = deduplicator;
        self
    }

    pub fn with_categorizer(mut self, categorizer: Categorizer) -> Self {
        self.categorizer = categorizer;
        self
    }

    /// Ingest every resource scoring at least `min_score`, or only
    /// `resource_id` when given.
    ///
    /// Scrape failures are counted in the report; catalog write failures
    /// abort the run.
    #[instrument(skip_all, fields(min_score, resource_id))]
    pub async fn run(
        &self,
        min_score: f64,
        resource_id: Option<&str>,
        progress: &dyn ProgressReporter,
    ) -> Result<IngestionReport> {
        let start = Instant::now();
        let resources: Vec<Resource> = self
            .catalog
            .get_all(min_score)
            .await?
            .into_iter()
            .filter(|r| resource_id.is_none_or(|id| r.id == id))
            .collect();

        let mut report = IngestionReport {
            total_resources: resources.len(),
            ..Default::default()
        };
        if resources.is_empty() {
            warn!("no resources selected for ingestion");
            return Ok(report);
        }
        info!(resources = resources.len(), "ingestion starting");

        // --- Scrape ---
        progress.phase("Scraping resources");
        let contents = self.scrape_all(&resources, &mut report, progress).await;
        info!(scraped = report.scraped, failed = report.failed, "scraping complete");

        // --- Dedup ---
        progress.phase("Detecting duplicates");
        let groups = self.deduplicator.find_duplicates(&contents);
        let flagged: HashSet<&str> = groups
            .iter()
            .flat_map(|g| g.duplicate_ids.iter().map(String::as_str))
            .collect();
        report.duplicate_groups = groups.len();
        report.duplicates_flagged = flagged.len();
        if !flagged.is_empty() {
            info!(
                groups = report.duplicate_groups,
                flagged = report.duplicates_flagged,
                "duplicates flagged"
            );
        }

        // --- Categorize + write back ---
        progress.phase("Categorizing content");
        let mut by_id: HashMap<&str, &Resource> =
            resources.iter().map(|r| (r.id.as_str(), r)).collect();
        let now = Utc::now();
        for content in &contents {
            let Some(original) = by_id.remove(content.resource_id.as_str()) else {
                continue;
            };
            let mut resource = original.clone();
            if flagged.contains(content.resource_id.as_str()) {
                resource.is_active = false;
                resource.last_verified_at = Some(now);
                debug!(id = %resource.id, "marked inactive as duplicate");
            } else {
                let categorization = self.categorizer.categorize(content);
                merge_categorization(&mut resource, &categorization, content, now);
                report.recategorized += 1;
            }
            self.catalog.upsert(resource, 0.0).await?;
        }

        info!(
            recategorized = report.recategorized,
            duplicates = report.duplicates_flagged,
            errors = report.errors.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ingestion complete"
        );
        Ok(report)
    }

    async fn scrape_all(
        &self,
        resources: &[Resource],
        report: &mut IngestionReport,
        progress: &dyn ProgressReporter,
    ) -> Vec<ScrapedContent> {
        let mut handles = Vec::with_capacity(resources.len());
        for resource in resources {
            let Some(scraper) = self.scrapers.find(resource) else {
                warn!(url = %resource.url, content_type = %resource.content_type, "no scraper available");
                report.failed += 1;
                continue;
            };
            let resource = resource.clone();
            handles.push(tokio::spawn(async move {
                let outcome = scraper.scrape(&resource).await;
                (resource.url, outcome)
            }));
        }

        let total = handles.len();
        let mut contents = Vec::with_capacity(total);
        for (i, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok((url, Ok(Some(content)))) => {
                    progress.item_done(&url, i + 1, total);
                    report.scraped += 1;
                    contents.push(content);
                }
                Ok((url, Ok(None))) => {
                    progress.item_done(&url, i + 1, total);
                    report.failed += 1;
                }
                Ok((url, Err(e))) => {
                    warn!(url = %url, error = %e, "scrape failed");
                    progress.item_done(&url, i + 1, total);
                    report.failed += 1;
                    report.errors.push(e.to_string());
                }
                Err(e) => {
                    warn!(error = %e, "scrape task failed");
                    report.failed += 1;
                    report.errors.push(format!("scrape task failed: {e}"));
                }
            }
        }
        contents
    }
}

/// Fold a categorization into a resource.
///
/// The detected primary domain moves to the front, secondaries are appended
/// when missing and tags are unioned. Hours are back-filled from the word
/// count only when the resource has no estimate yet.
pub fn merge_categorization(
    resource: &mut Resource,
    categorization: &Categorization,
    content: &ScrapedContent,
    now: DateTime<Utc>,
) {
    if let Some(primary) = categorization.primary_domain {
        resource.domains.retain(|d| *d != primary);
        resource.domains.insert(0, primary);
    }
    for domain in &categorization.secondary_domains {
        if !resource.domains.contains(domain) {
            resource.domains.push(*domain);
        }
    }
    for tag in &categorization.tags {
        if !resource.tags.contains(tag) {
            resource.tags.push(tag.clone());
        }
    }
    if resource.estimated_hours.is_none() && content.word_count > 0 {
        let reading_hours = content.word_count as f64 / (WORDS_PER_MINUTE * 60.0);
        resource.estimated_hours = Some(round_to(reading_hours * PRACTICE_FACTOR, 1));
    }
    resource.last_verified_at = Some(now);
}
