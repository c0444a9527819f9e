//! Heuristic quality scoring: turns a raw [`SearchResult`] into a scored
//! [`Resource`].
//!
//! The score is the sum of six capped components:
//!
//! | component              | max  |
//! |------------------------|------|
//! | provider reputation    | 0.20 |
//! | taxonomy relevance     | 0.25 |
//! | content-type richness  | 0.15 |
//! | community (stars)      | 0.15 |
//! | freshness              | 0.15 |
//! | description length    | 0.10 |
//!
//! clamped to 1.0 and rounded to three decimals. Evaluation is a pure
//! function of the result and the supplied clock.

use chrono::{DateTime, NaiveDate, Utc};

use trainingcatalog_shared::taxonomy::TAXONOMY;
use trainingcatalog_shared::text::{keyword_score, round_to};
use trainingcatalog_shared::{
    ContentType, DifficultyLevel, LicenseType, Resource, SearchResult, SkillDomain,
};

/// Providers with an established reputation, checked in order; the first
/// substring hit wins.
pub const REPUTABLE_PROVIDERS: &[(&str, f64)] = &[
    ("fast.ai", 0.20),
    ("deeplearning.ai", 0.20),
    ("stanford", 0.20),
    ("mit", 0.20),
    ("google", 0.15),
    ("microsoft", 0.15),
    ("huggingface", 0.18),
    ("openai", 0.15),
    ("coursera", 0.12),
    ("kaggle", 0.14),
    ("arxiv", 0.10),
    ("github", 0.10),
];

/// Domains must score strictly above this to be attached.
const DOMAIN_THRESHOLD: f64 = 0.02;

/// At most this many domains are attached to a fresh resource.
const MAX_DOMAINS: usize = 3;

const RELEVANCE_CAP: f64 = 0.25;
const COMMUNITY_CAP: f64 = 0.15;

// ---------------------------------------------------------------------------
// Score breakdown
// ---------------------------------------------------------------------------

/// Individual score components, kept for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub provider: f64,
    pub relevance: f64,
    pub richness: f64,
    pub community: f64,
    pub freshness: f64,
    pub completeness: f64,
}

impl ScoreBreakdown {
    /// Clamped, rounded total.
    pub fn total(&self) -> f64 {
        let sum = self.provider
            + self.relevance
            + self.richness
            + self.community
            + self.freshness
            + self.completeness;
        round_to(sum.min(1.0), 3)
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate against the current wall clock.
pub fn evaluate(result: &SearchResult) -> Resource {
    evaluate_at(result, Utc::now())
}

/// Evaluate with an explicit clock. `now` also becomes `discovered_at`.
pub fn evaluate_at(result: &SearchResult, now: DateTime<Utc>) -> Resource {
    let haystack = format!("{} {} {}", result.url, result.title, result.snippet).to_lowercase();
    let scored_domains = detect_domains(&format!("{} {}", result.title, result.snippet));
    let provider = detect_provider(&haystack);
    let content_type = detect_content_type(&haystack);
    let breakdown = score(result, provider, &scored_domains, content_type, now);

    let mut resource = Resource::new(&result.url, &result.title);
    resource.description = result.snippet.clone();
    resource.provider = provider.to_string();
    resource.domains = scored_domains.iter().map(|(d, _)| *d).collect();
    resource.content_type = content_type;
    resource.difficulty = detect_difficulty(&haystack);
    resource.license = detect_license(&result.raw_metadata);
    resource.quality_score = breakdown.total();
    resource.discovered_at = now;
    resource.raw_metadata = result.raw_metadata.clone();
    resource
}

/// Compute the component scores for a result.
pub fn score(
    result: &SearchResult,
    provider: &str,
    scored_domains: &[(SkillDomain, f64)],
    content_type: ContentType,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    let provider = REPUTABLE_PROVIDERS
        .iter()
        .find(|(name, _)| *name == provider)
        .map(|(_, weight)| *weight)
        .unwrap_or(0.0);

    let relevance = scored_domains
        .iter()
        .map(|(_, s)| *s)
        .fold(0.0, f64::max)
        .min(RELEVANCE_CAP);

    let stars = result
        .raw_metadata
        .get("stars")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    let community = if stars > 0 {
        ((stars as f64 + 1.0).log10() / 35.0).min(COMMUNITY_CAP)
    } else {
        0.0
    };

    let freshness = result
        .raw_metadata
        .get("updated_at")
        .and_then(|v| v.as_str())
        .and_then(parse_timestamp)
        .map(|updated| match (now - updated).num_days() {
            d if d < 365 => 0.15,
            d if d < 730 => 0.08,
            _ => 0.0,
        })
        .unwrap_or(0.0);

    let snippet_len = result.snippet.chars().count();
    let completeness = if snippet_len > 50 {
        0.10
    } else if snippet_len > 10 {
        0.05
    } else {
        0.0
    };

    ScoreBreakdown {
        provider,
        relevance,
        richness: richness(content_type),
        community,
        freshness,
        completeness,
    }
}

/// Static richness weight per content type.
pub fn richness(content_type: ContentType) -> f64 {
    match content_type {
        ContentType::Course => 0.15,
        ContentType::InteractiveNotebook => 0.14,
        ContentType::Book => 0.12,
        ContentType::VideoSeries => 0.11,
        ContentType::Tutorial | ContentType::CertificationPrep => 0.10,
        ContentType::Paper => 0.08,
        ContentType::Documentation => 0.07,
        ContentType::BlogSeries => 0.06,
    }
}

// ---------------------------------------------------------------------------
// Detection heuristics (inputs are already lowercased)
// ---------------------------------------------------------------------------

/// First reputable provider whose name occurs in `text`, or `""`.
pub fn detect_provider(text: &str) -> &'static str {
    REPUTABLE_PROVIDERS
        .iter()
        .find(|(name, _)| text.contains(name))
        .map(|(name, _)| *name)
        .unwrap_or("")
}

pub fn detect_content_type(text: &str) -> ContentType {
    let any = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if any(&["course", "mooc", "syllabus", "lecture"]) {
        ContentType::Course
    } else if any(&["tutorial", "how to", "step by step", "guide"]) {
        ContentType::Tutorial
    } else if any(&["arxiv", "paper"]) {
        ContentType::Paper
    } else if any(&["video", "youtube", "watch"]) {
        ContentType::VideoSeries
    } else if any(&["book", "textbook", "ebook"]) {
        ContentType::Book
    } else if any(&["notebook", "colab", "jupyter"]) {
        ContentType::InteractiveNotebook
    } else if any(&["documentation", "docs"]) {
        ContentType::Documentation
    } else {
        ContentType::Tutorial
    }
}

pub fn detect_difficulty(text: &str) -> DifficultyLevel {
    let any = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if any(&["advanced", "expert", "research", "state-of-the-art"]) {
        DifficultyLevel::Advanced
    } else if any(&["intermediate", "practical", "hands-on project"]) {
        DifficultyLevel::Intermediate
    } else {
        DifficultyLevel::Beginner
    }
}

/// Taxonomy domains scoring above the threshold, best first, at most three.
/// Ties keep taxonomy order.
pub fn detect_domains(text: &str) -> Vec<(SkillDomain, f64)> {
    let mut scored: Vec<(SkillDomain, f64)> = TAXONOMY
        .iter()
        .map(|node| (node.domain, keyword_score(text, node.keywords)))
        .filter(|(_, s)| *s > DOMAIN_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(MAX_DOMAINS);
    scored
}

fn detect_license(raw: &serde_json::Value) -> LicenseType {
    raw.get("license")
        .and_then(|v| v.as_str())
        .map(LicenseType::from_spdx)
        .unwrap_or_default()
}

/// RFC 3339 timestamps, or bare `YYYY-MM-DD` dates taken as UTC midnight.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}
