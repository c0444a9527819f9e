//! Shared types, error model, taxonomy and configuration for the training
//! catalog.
//!
//! This crate is the foundation depended on by all other crates.
//! It provides:
//! - [`TrainingCatalogError`]: the unified error type
//! - Domain types ([`Resource`], [`SearchResult`], [`ScrapedContent`], [`Curriculum`], ...)
//! - The static skill [`taxonomy`] and [`text`] similarity helpers
//! - Configuration ([`AppConfig`], [`Settings`], [`Credentials`], config loading)

pub mod config;
pub mod curriculum;
pub mod error;
pub mod taxonomy;
pub mod text;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, Credentials, CurriculumConfig, FetchConfig, QualityConfig, SearchConfig, Settings,
    StorageConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    write_default_config,
};
pub use curriculum::{
    BloomLevel, Curriculum, CurriculumMetadata, LearningObjective, LearningPath, ModuleUnit,
    Severity, ValidationIssue, ValidationReport,
};
pub use error::{Result, TrainingCatalogError};
pub use taxonomy::{TAXONOMY, TaxonomyNode};
pub use types::{
    ContentType, DifficultyLevel, DuplicateGroup, LicenseType, Resource, ScrapedContent,
    SearchResult, SkillCategory, SkillDomain, canonical_url, parse_domains, resource_id,
};
