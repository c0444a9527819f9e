//! Core domain types for the training catalog.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainingCatalogError};
use crate::text::sha256_hex;

// ---------------------------------------------------------------------------
// Skill domains
// ---------------------------------------------------------------------------

/// Top-level division of the skill taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Technical,
    Business,
}

impl SkillCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Business => "business",
        }
    }

    /// Title-cased label, e.g. `Business`.
    pub fn title(self) -> &'static str {
        match self {
            Self::Technical => "Technical",
            Self::Business => "Business",
        }
    }
}

/// A specific skill domain covered by training content.
///
/// Variant order matches the taxonomy table; `Ord` sorts by wire name via
/// [`SkillDomain::as_str`] where callers need name order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillDomain {
    MlBasics,
    DeepLearning,
    Nlp,
    ComputerVision,
    Mlops,
    GenerativeAi,
    ReinforcementLearning,
    DataEngineering,
    AiStrategy,
    AiEthics,
    AiProjectManagement,
    AiRoi,
    AiGovernance,
}

impl SkillDomain {
    /// Every domain, in taxonomy order.
    pub const ALL: [SkillDomain; 13] = [
        Self::MlBasics,
        Self::DeepLearning,
        Self::Nlp,
        Self::ComputerVision,
        Self::Mlops,
        Self::GenerativeAi,
        Self::ReinforcementLearning,
        Self::DataEngineering,
        Self::AiStrategy,
        Self::AiEthics,
        Self::AiProjectManagement,
        Self::AiRoi,
        Self::AiGovernance,
    ];

    /// Wire name (`ml_basics`, `ai_roi`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MlBasics => "ml_basics",
            Self::DeepLearning => "deep_learning",
            Self::Nlp => "nlp",
            Self::ComputerVision => "computer_vision",
            Self::Mlops => "mlops",
            Self::GenerativeAi => "generative_ai",
            Self::ReinforcementLearning => "reinforcement_learning",
            Self::DataEngineering => "data_engineering",
            Self::AiStrategy => "ai_strategy",
            Self::AiEthics => "ai_ethics",
            Self::AiProjectManagement => "ai_project_management",
            Self::AiRoi => "ai_roi",
            Self::AiGovernance => "ai_governance",
        }
    }

    pub fn category(self) -> SkillCategory {
        match self {
            Self::AiStrategy
            | Self::AiEthics
            | Self::AiProjectManagement
            | Self::AiRoi
            | Self::AiGovernance => SkillCategory::Business,
            _ => SkillCategory::Technical,
        }
    }

    /// Wire name with underscores replaced and each word capitalized
    /// (`ml_basics` -> `Ml Basics`).
    pub fn title(self) -> String {
        title_case(&self.as_str().replace('_', " "))
    }
}

impl fmt::Display for SkillDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillDomain {
    type Err = TrainingCatalogError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == wanted)
            .ok_or_else(|| {
                TrainingCatalogError::validation(format!(
                    "unknown skill domain '{s}' (expected one of: {})",
                    Self::ALL
                        .iter()
                        .map(|d| d.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Parse a list of domain names, failing on the first unknown one.
pub fn parse_domains<S: AsRef<str>>(names: &[S]) -> Result<Vec<SkillDomain>> {
    names.iter().map(|n| n.as_ref().parse()).collect()
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Content classification enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Course,
    #[default]
    Tutorial,
    Documentation,
    VideoSeries,
    Book,
    Paper,
    BlogSeries,
    InteractiveNotebook,
    CertificationPrep,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Tutorial => "tutorial",
            Self::Documentation => "documentation",
            Self::VideoSeries => "video_series",
            Self::Book => "book",
            Self::Paper => "paper",
            Self::BlogSeries => "blog_series",
            Self::InteractiveNotebook => "interactive_notebook",
            Self::CertificationPrep => "certification_prep",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty band. Ordered `Beginner < Intermediate < Advanced`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }

    /// The band directly below this one, if any.
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::Beginner => None,
            Self::Intermediate => Some(Self::Beginner),
            Self::Advanced => Some(Self::Intermediate),
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseType {
    CcBy,
    CcBySa,
    CcByNc,
    Mit,
    #[serde(rename = "apache_2")]
    Apache2,
    FreeAccess,
    #[default]
    Unknown,
}

impl LicenseType {
    /// Map an SPDX identifier (as reported by code hosts) to a license bucket.
    pub fn from_spdx(spdx: &str) -> Self {
        let id = spdx.trim().to_ascii_uppercase();
        match id.as_str() {
            "MIT" => Self::Mit,
            "APACHE-2.0" => Self::Apache2,
            _ if id.starts_with("CC-BY-NC") => Self::CcByNc,
            _ if id.starts_with("CC-BY-SA") => Self::CcBySa,
            _ if id.starts_with("CC-BY") => Self::CcBy,
            _ => Self::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// Resource identity
// ---------------------------------------------------------------------------

/// Canonical form of a URL for identity and dedup: trimmed, trailing
/// slashes removed, lowercased.
pub fn canonical_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}

/// Deterministic resource id: first 16 hex chars of SHA-256 over the
/// canonical URL.
pub fn resource_id(url: &str) -> String {
    let mut hash = sha256_hex(&canonical_url(url));
    hash.truncate(16);
    hash
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A single training resource tracked by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub provider: String,
    /// Ordered, primary domain first.
    #[serde(default)]
    pub domains: Vec<SkillDomain>,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub difficulty: DifficultyLevel,
    #[serde(default, rename = "license_type")]
    pub license: LicenseType,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub quality_score: f64,
    pub discovered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "empty_object")]
    pub raw_metadata: serde_json::Value,
}

fn default_language() -> String {
    "en".into()
}
fn default_true() -> bool {
    true
}
fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Resource {
    /// Create a resource with defaults for every field except identity.
    /// The id is derived from `url`.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: resource_id(&url),
            url,
            title: title.into(),
            description: String::new(),
            provider: String::new(),
            domains: Vec::new(),
            content_type: ContentType::default(),
            difficulty: DifficultyLevel::default(),
            license: LicenseType::default(),
            language: default_language(),
            estimated_hours: None,
            prerequisites: Vec::new(),
            tags: Vec::new(),
            quality_score: 0.0,
            discovered_at: Utc::now(),
            last_verified_at: None,
            is_active: true,
            raw_metadata: empty_object(),
        }
    }

    pub fn primary_domain(&self) -> Option<SkillDomain> {
        self.domains.first().copied()
    }
}

// ---------------------------------------------------------------------------
// Ephemeral pipeline records
// ---------------------------------------------------------------------------

/// A raw hit returned by a searcher. Never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    /// Name of the searcher that produced this hit.
    pub source: String,
    #[serde(default = "empty_object")]
    pub raw_metadata: serde_json::Value,
}

/// Text and structure extracted from a resource's page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedContent {
    pub resource_id: String,
    pub url: String,
    pub text: String,
    pub headings: Vec<String>,
    pub code_blocks: Vec<String>,
    pub links: Vec<String>,
    /// SHA-256 of the normalized text.
    pub content_hash: String,
    pub word_count: usize,
    pub scraped_at: DateTime<Utc>,
}

/// A cluster of near-identical resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub canonical_id: String,
    pub duplicate_ids: Vec<String>,
    /// Mean Jaccard similarity over every member pair.
    pub similarity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_is_case_and_slash_insensitive() {
        assert_eq!(
            resource_id("https://EXAMPLE.com/Path/"),
            resource_id("https://example.com/path")
        );
        assert_eq!(resource_id("  https://example.com/a  ").len(), 16);
        assert_ne!(resource_id("https://example.com/a"), resource_id("https://example.com/b"));
    }

    #[test]
    fn new_resource_derives_id_from_url() {
        let r = Resource::new("https://course.fast.ai/", "Practical Deep Learning");
        assert_eq!(r.id, resource_id("https://course.fast.ai"));
        assert!(r.is_active);
        assert_eq!(r.language, "en");
        assert!(r.raw_metadata.is_object());
    }

    #[test]
    fn domain_parsing() {
        assert_eq!("nlp".parse::<SkillDomain>().unwrap(), SkillDomain::Nlp);
        assert_eq!(" AI_ROI ".parse::<SkillDomain>().unwrap(), SkillDomain::AiRoi);

        let err = "quantum".parse::<SkillDomain>().unwrap_err();
        assert!(matches!(err, TrainingCatalogError::Validation { .. }));

        let parsed = parse_domains(&["ml_basics", "ai_ethics"]).unwrap();
        assert_eq!(parsed, vec![SkillDomain::MlBasics, SkillDomain::AiEthics]);
        assert!(parse_domains(&["ml_basics", "bogus"]).is_err());
    }

    #[test]
    fn domain_titles_and_categories() {
        assert_eq!(SkillDomain::MlBasics.title(), "Ml Basics");
        assert_eq!(SkillDomain::AiProjectManagement.title(), "Ai Project Management");
        assert_eq!(SkillDomain::AiRoi.category(), SkillCategory::Business);
        assert_eq!(SkillDomain::Mlops.category(), SkillCategory::Technical);
    }

    #[test]
    fn wire_names_match_as_str() {
        for domain in SkillDomain::ALL {
            let json = serde_json::to_string(&domain).unwrap();
            assert_eq!(json, format!("\"{}\"", domain.as_str()));
        }
        assert_eq!(
            serde_json::to_string(&LicenseType::Apache2).unwrap(),
            "\"apache_2\""
        );
        assert_eq!(
            serde_json::to_string(&ContentType::InteractiveNotebook).unwrap(),
            "\"interactive_notebook\""
        );
    }

    #[test]
    fn spdx_mapping() {
        assert_eq!(LicenseType::from_spdx("mit"), LicenseType::Mit);
        assert_eq!(LicenseType::from_spdx("Apache-2.0"), LicenseType::Apache2);
        assert_eq!(LicenseType::from_spdx("CC-BY-SA-4.0"), LicenseType::CcBySa);
        assert_eq!(LicenseType::from_spdx("CC-BY-NC-4.0"), LicenseType::CcByNc);
        assert_eq!(LicenseType::from_spdx("CC-BY-4.0"), LicenseType::CcBy);
        assert_eq!(LicenseType::from_spdx("GPL-3.0"), LicenseType::Unknown);
    }

    #[test]
    fn difficulty_ordering() {
        assert!(DifficultyLevel::Beginner < DifficultyLevel::Advanced);
        assert_eq!(DifficultyLevel::Advanced.previous(), Some(DifficultyLevel::Intermediate));
        assert_eq!(DifficultyLevel::Beginner.previous(), None);
    }

    #[test]
    fn resource_serialization_roundtrip() {
        let mut r = Resource::new("https://example.com/course", "Intro");
        r.domains = vec![SkillDomain::Nlp, SkillDomain::DeepLearning];
        r.estimated_hours = Some(3.5);
        r.tags = vec!["text classification".into()];
        r.quality_score = 0.42;

        let json = serde_json::to_string(&r).expect("serialize");
        assert!(json.contains("\"license_type\":\"unknown\""));
        let parsed: Resource = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, r);
    }
}
