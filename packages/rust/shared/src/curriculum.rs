//! Curriculum document model: learning paths, modules, objectives and the
//! validation report produced for a generated curriculum.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text::sha256_hex;
use crate::types::{DifficultyLevel, SkillDomain};

// ---------------------------------------------------------------------------
// Objectives and modules
// ---------------------------------------------------------------------------

/// Bloom-taxonomy cognitive level of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloomLevel {
    Remember,
    #[default]
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl BloomLevel {
    /// Verb level matched to a difficulty band.
    pub fn for_difficulty(difficulty: DifficultyLevel) -> Self {
        match difficulty {
            DifficultyLevel::Beginner => Self::Understand,
            DifficultyLevel::Intermediate => Self::Apply,
            DifficultyLevel::Advanced => Self::Evaluate,
        }
    }

    /// Capitalized verb, used as the leading word of an objective.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Remember => "Remember",
            Self::Understand => "Understand",
            Self::Apply => "Apply",
            Self::Analyze => "Analyze",
            Self::Evaluate => "Evaluate",
            Self::Create => "Create",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningObjective {
    pub description: String,
    #[serde(default)]
    pub bloom_level: BloomLevel,
}

/// A unit within a learning path grouping a handful of resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleUnit {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resource_ids: Vec<String>,
    #[serde(default)]
    pub objectives: Vec<LearningObjective>,
    #[serde(default)]
    pub estimated_hours: f64,
    /// 1-based position within the path.
    #[serde(default)]
    pub order: u32,
}

// ---------------------------------------------------------------------------
// Learning path
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub difficulty: DifficultyLevel,
    #[serde(default)]
    pub domains: Vec<SkillDomain>,
    #[serde(default)]
    pub modules: Vec<ModuleUnit>,
    #[serde(default)]
    pub total_estimated_hours: f64,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0".into()
}

impl LearningPath {
    /// Stable id for a (domain, difficulty) pair: first 12 hex chars of
    /// SHA-256 over `"{domain}-{difficulty}"`.
    pub fn stable_id(domain: SkillDomain, difficulty: DifficultyLevel) -> String {
        let mut id = sha256_hex(&format!("{domain}-{difficulty}"));
        id.truncate(12);
        id
    }

    /// Recompute the total from module hours, rounded to 0.1.
    pub fn recalculate_hours(&mut self) {
        let total: f64 = self.modules.iter().map(|m| m.estimated_hours).sum();
        self.total_estimated_hours = (total * 10.0).round() / 10.0;
    }

    /// Every resource id referenced by this path, in module order.
    pub fn resource_ids(&self) -> impl Iterator<Item = &str> {
        self.modules
            .iter()
            .flat_map(|m| m.resource_ids.iter().map(String::as_str))
    }
}

// ---------------------------------------------------------------------------
// Curriculum
// ---------------------------------------------------------------------------

/// Summary numbers stored alongside a curriculum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurriculumMetadata {
    #[serde(default)]
    pub domains_covered: Vec<SkillDomain>,
    #[serde(default)]
    pub total_resources: usize,
    #[serde(default)]
    pub total_paths: usize,
}

/// A complete training programme. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub learning_paths: Vec<LearningPath>,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub source_catalog_hash: String,
    #[serde(default)]
    pub metadata: CurriculumMetadata,
}

impl Curriculum {
    /// Reproducible id: first 12 hex chars of SHA-256 over
    /// `"{title}-{catalog_hash}"`.
    pub fn stable_id(title: &str, catalog_hash: &str) -> String {
        let mut id = sha256_hex(&format!("{title}-{catalog_hash}"));
        id.truncate(12);
        id
    }

    pub fn total_hours(&self) -> f64 {
        self.learning_paths
            .iter()
            .map(|p| p.total_estimated_hours)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// One finding from a best-practice rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path_id: String,
    pub rule: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count(Severity::Info)
    }

    /// Issues raised by a given rule.
    pub fn by_rule<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues.iter().filter(move |i| i.rule == rule)
    }
}
