//! Core operations for the training catalog.
//!
//! This crate ties discovery, ingestion and curriculum generation together
//! into end-to-end workflows (see [`pipeline`]), and hosts the read-side
//! [`catalog`] operations and rural [`contextualize`]ation.

pub mod catalog;
pub mod contextualize;
pub mod curriculum;
pub mod ingest;
pub mod pipeline;

pub use catalog::{CatalogListing, CatalogStats};
pub use contextualize::{ContextLibrary, ContextRenderer, ContextualizedPath, JsonRenderer};
pub use ingest::{IngestionPipeline, IngestionReport};
pub use pipeline::{ProgressReporter, SilentProgress};
