//! Discovery orchestration: query generation, concurrent fan-out to every
//! searcher, URL dedup, evaluation and catalog upsert.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use trainingcatalog_shared::taxonomy::{self, TaxonomyNode};
use trainingcatalog_shared::{SearchResult, SkillDomain, canonical_url};
use trainingcatalog_storage::{CatalogStore, UpsertOutcome};

use crate::evaluator::evaluate_at;
use crate::searcher::{Searcher, SearcherKind};

/// Templates instantiated with a domain's display name for every searcher.
const GENERAL_TEMPLATES: &[&str] = &[
    "free {topic} course open source",
    "{topic} tutorial beginner 2024 2025",
    "{topic} training materials open access",
    "learn {topic} free online",
    "best free resources {topic}",
];

/// Hands-on templates sent only to code-hosting searchers.
const HANDS_ON_TEMPLATES: &[&str] = &[
    "{topic} tutorial notebook",
    "{topic} course exercises",
    "awesome {topic}",
    "{topic} hands-on examples",
    "{topic} learning resources",
    "{topic} workshop lab",
    "{keyword} jupyter notebook tutorial",
    "{keyword} project beginner",
];

/// Keyword-specific general queries per domain.
const GENERAL_KEYWORD_QUERIES: usize = 3;

/// Keyword-specific hands-on queries per domain.
const HANDS_ON_KEYWORD_QUERIES: usize = 5;

// ---------------------------------------------------------------------------
// DiscoveryReport
// ---------------------------------------------------------------------------

/// Summary of one discovery run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    /// Searcher invocations: general queries × all searchers plus hands-on
    /// queries × code-hosting searchers.
    pub queries_executed: usize,
    /// Results returned across all invocations, before dedup.
    pub raw_results: usize,
    /// Results left after URL dedup.
    pub unique_results: usize,
    pub new_resources: usize,
    pub updated_resources: usize,
    pub below_threshold: usize,
    pub errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// Query generation
// ---------------------------------------------------------------------------

/// General queries for the given taxonomy nodes.
pub fn build_queries(nodes: &[&TaxonomyNode]) -> Vec<String> {
    let mut queries = Vec::new();
    for node in nodes {
        for template in GENERAL_TEMPLATES {
            queries.push(template.replace("{topic}", node.display_name));
        }
        for kw in node.keywords.iter().take(GENERAL_KEYWORD_QUERIES) {
            queries.push(format!("free {kw} tutorial course"));
        }
    }
    queries
}

/// Hands-on queries for the given taxonomy nodes.
pub fn build_hands_on_queries(nodes: &[&TaxonomyNode]) -> Vec<String> {
    let mut queries = Vec::new();
    for node in nodes {
        let keyword = node.keywords.first().copied().unwrap_or(node.display_name);
        for template in HANDS_ON_TEMPLATES {
            queries.push(
                template
                    .replace("{topic}", node.display_name)
                    .replace("{keyword}", keyword),
            );
        }
        for kw in node.keywords.iter().take(HANDS_ON_KEYWORD_QUERIES) {
            queries.push(format!("{kw} tutorial notebook exercises"));
        }
    }
    queries
}

// ---------------------------------------------------------------------------
// DiscoveryAgent
// ---------------------------------------------------------------------------

/// Runs searches across every registered searcher and feeds the catalog.
pub struct DiscoveryAgent {
    searchers: Vec<Arc<dyn Searcher>>,
    catalog: Arc<CatalogStore>,
    min_quality_score: f64,
}

impl DiscoveryAgent {
    pub fn new(
        searchers: Vec<Arc<dyn Searcher>>,
        catalog: Arc<CatalogStore>,
        min_quality_score: f64,
    ) -> Self {
        Self {
            searchers,
            catalog,
            min_quality_score,
        }
    }

    /// Discover resources for `domains` (every domain when empty).
    ///
    /// Individual searcher, task and upsert failures are recorded in the
    /// report; the run itself always completes.
    #[instrument(skip_all, fields(domains = domains.len(), searchers = self.searchers.len()))]
    pub async fn run(&self, domains: &[SkillDomain], max_results_per_query: usize) -> DiscoveryReport {
        let nodes = taxonomy::nodes_for(domains);
        let queries = build_queries(&nodes);
        let hands_on = build_hands_on_queries(&nodes);
        let code_hosts: Vec<Arc<dyn Searcher>> = self
            .searchers
            .iter()
            .filter(|s| s.kind() == SearcherKind::CodeHosting)
            .cloned()
            .collect();

        let mut report = DiscoveryReport {
            queries_executed: queries.len() * self.searchers.len() + hands_on.len() * code_hosts.len(),
            ..Default::default()
        };

        info!(
            general_queries = queries.len(),
            hands_on_queries = hands_on.len(),
            code_hosts = code_hosts.len(),
            tasks = report.queries_executed,
            "starting discovery"
        );

        // Fan out every (query, searcher) pair.
        let mut handles = Vec::with_capacity(report.queries_executed);
        let pairs = queries
            .iter()
            .flat_map(|q| self.searchers.iter().map(move |s| (q, s)))
            .chain(hands_on.iter().flat_map(|q| code_hosts.iter().map(move |s| (q, s))));
        for (query, searcher) in pairs {
            let searcher = searcher.clone();
            let query = query.clone();
            handles.push(tokio::spawn(async move {
                searcher.search(&query, max_results_per_query).await
            }));
        }

        let mut batches: Vec<Vec<SearchResult>> = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(results) => batches.push(results),
                Err(e) => {
                    warn!(error = %e, "search task failed");
                    report.errors.push(format!("search task failed: {e}"));
                }
            }
        }

        report.raw_results = batches.iter().map(Vec::len).sum();
        let unique = dedup_by_url(batches);
        report.unique_results = unique.len();
        debug!(raw = report.raw_results, unique = unique.len(), "deduplicated results");

        let now = Utc::now();
        for result in unique {
            let resource = evaluate_at(&result, now);
            match self.catalog.upsert(resource, self.min_quality_score).await {
                Ok(UpsertOutcome::Inserted) => report.new_resources += 1,
                Ok(UpsertOutcome::Updated) => report.updated_resources += 1,
                Ok(UpsertOutcome::Rejected) => report.below_threshold += 1,
                Err(e) => {
                    warn!(url = %result.url, error = %e, "failed to catalog result");
                    report.errors.push(format!("{}: {e}", result.url));
                }
            }
        }

        info!(
            new = report.new_resources,
            updated = report.updated_resources,
            below_threshold = report.below_threshold,
            errors = report.errors.len(),
            "discovery completed"
        );
        report
    }
}

/// Flatten result batches keeping the first occurrence of each canonical URL.
fn dedup_by_url(batches: Vec<Vec<SearchResult>>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    batches
        .into_iter()
        .flatten()
        .filter(|r| seen.insert(canonical_url(&r.url)))
        .collect()
}
