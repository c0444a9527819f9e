//! Content ingestion: page scraping, near-duplicate detection and taxonomy
//! classification.
//!
//! This crate provides:
//! - [`Scraper`] and [`ScraperRegistry`]: capability-matched content extraction
//! - [`HtmlScraper`]: the built-in markup extractor
//! - [`Deduplicator`]: trigram/Jaccard clustering of scraped documents
//! - [`Categorizer`]: keyword scoring against the skill taxonomy
//!
//! Orchestration of these stages lives in `trainingcatalog-core`.

pub mod categorize;
pub mod dedup;
pub mod html;
pub mod scraper;

pub use categorize::{Categorization, Categorizer};
pub use dedup::Deduplicator;
pub use html::{ExtractedPage, HtmlScraper, extract};
pub use self::scraper::{Scraper, ScraperRegistry};
