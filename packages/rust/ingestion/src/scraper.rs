//! Scraper capability and the registry that matches resources to scrapers.

use std::sync::Arc;

use async_trait::async_trait;

use trainingcatalog_fetch::Fetcher;
use trainingcatalog_shared::{Resource, Result, ScrapedContent};

use crate::html::HtmlScraper;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Extracts page content for a catalogued resource.
///
/// `Ok(None)` means the page could not be used (non-2xx response, nothing
/// extractable). `Err` is reserved for fetch failures.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Human-readable scraper name for tracing.
    fn name(&self) -> &str;

    /// Whether this scraper understands the given resource.
    fn can_handle(&self, resource: &Resource) -> bool;

    async fn scrape(&self, resource: &Resource) -> Result<Option<ScrapedContent>>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered scrapers in priority order.
#[derive(Clone, Default)]
pub struct ScraperRegistry {
    scrapers: Vec<Arc<dyn Scraper>>,
}

impl ScraperRegistry {
    /// Registry with the built-in markup scraper.
    pub fn new(fetcher: Fetcher) -> Self {
        let mut registry = Self::default();
        registry.register(Arc::new(HtmlScraper::new(fetcher)));
        registry
    }

    /// Append a scraper. Earlier registrations win.
    pub fn register(&mut self, scraper: Arc<dyn Scraper>) {
        self.scrapers.push(scraper);
    }

    /// The first scraper able to handle `resource`, if any.
    pub fn find(&self, resource: &Resource) -> Option<Arc<dyn Scraper>> {
        self.scrapers
            .iter()
            .find(|s| s.can_handle(resource))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.scrapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrapers.is_empty()
    }
}
