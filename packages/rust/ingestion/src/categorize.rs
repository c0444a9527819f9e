//! Taxonomy classification of scraped content.

use std::collections::BTreeMap;

use serde::Serialize;

use trainingcatalog_shared::taxonomy::{TAXONOMY, TaxonomyNode};
use trainingcatalog_shared::text::{keyword_score, round_to, truncate_chars};
use trainingcatalog_shared::{ScrapedContent, SkillDomain};

const BODY_PREFIX_CHARS: usize = 10_000;
const MAX_SECONDARY: usize = 4;
const MAX_TAGS: usize = 15;

/// Domain assignment for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Categorization {
    pub resource_id: String,
    pub primary_domain: Option<SkillDomain>,
    pub secondary_domains: Vec<SkillDomain>,
    pub tags: Vec<String>,
    /// Every non-zero domain score, rounded to 4 decimals.
    pub domain_scores: BTreeMap<SkillDomain, f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct Categorizer {
    pub primary_threshold: f64,
    pub secondary_threshold: f64,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self {
            primary_threshold: 0.05,
            secondary_threshold: 0.02,
        }
    }
}

impl Categorizer {
    /// Score `content` against every taxonomy node.
    ///
    /// The best node at or above the primary threshold becomes the primary
    /// domain; every other node at or above the secondary threshold is a
    /// secondary domain. Tags are primary-node subtopics that occur
    /// literally in the content; without a primary there are no tags.
    pub fn categorize(&self, content: &ScrapedContent) -> Categorization {
        let text = format!(
            "{} {}",
            content.headings.join(" "),
            truncate_chars(&content.text, BODY_PREFIX_CHARS)
        );

        let mut ranked: Vec<(&TaxonomyNode, f64)> = TAXONOMY
            .iter()
            .map(|node| (node, keyword_score(&text, node.keywords)))
            .collect();
        // Stable: ties keep taxonomy order.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let domain_scores = ranked
            .iter()
            .filter(|(_, s)| *s > 0.0)
            .map(|(node, s)| (node.domain, round_to(*s, 4)))
            .collect();

        let mut primary: Option<&TaxonomyNode> = None;
        let mut secondary: Vec<&TaxonomyNode> = Vec::new();
        for &(node, score) in &ranked {
            if primary.is_none() && score >= self.primary_threshold {
                primary = Some(node);
            } else if score >= self.secondary_threshold && secondary.len() < MAX_SECONDARY {
                secondary.push(node);
            }
        }

        let lowered = text.to_lowercase();
        let tags = primary
            .into_iter()
            .flat_map(|node| node.subtopics.iter())
            .filter(|sub| lowered.contains(&sub.to_lowercase()))
            .map(|sub| sub.to_string())
            .take(MAX_TAGS)
            .collect();

        Categorization {
            resource_id: content.resource_id.clone(),
            primary_domain: primary.map(|n| n.domain),
            secondary_domains: secondary.iter().map(|n| n.domain).collect(),
            tags,
            domain_scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn content(headings: &[&str], text: &str) -> ScrapedContent {
        ScrapedContent {
            resource_id: "r1".into(),
            url: "https://example.com".into(),
            text: text.into(),
            headings: headings.iter().map(|h| h.to_string()).collect(),
            code_blocks: vec![],
            links: vec![],
            content_hash: String::new(),
            word_count: 0,
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn machine_learning_page() {
        let c = content(
            &["Supervised Learning", "Model Evaluation"],
            "Regression and classification are the core of machine learning. \
             We cover cross-validation, overfitting and gradient descent.",
        );
        let cat = Categorizer::default().categorize(&c);

        assert_eq!(cat.primary_domain, Some(SkillDomain::MlBasics));
        assert!(!cat.secondary_domains.contains(&SkillDomain::MlBasics));
        assert!(cat.secondary_domains.len() <= MAX_SECONDARY);
        assert_eq!(
            &cat.tags[..3],
            &["supervised learning", "model evaluation", "cross-validation"]
        );
        assert!(cat.domain_scores[&SkillDomain::MlBasics] > 0.05);
    }

    #[test]
    fn unrelated_text_has_no_domain() {
        let c = content(&["Bread"], "Knead the dough and let it rise overnight.");
        let cat = Categorizer::default().categorize(&c);
        assert_eq!(cat.primary_domain, None);
        assert!(cat.secondary_domains.is_empty());
        assert!(cat.tags.is_empty());
        assert!(cat.domain_scores.is_empty());
    }

    #[test]
    fn secondary_only_match_gets_no_tags() {
        let text = format!("backpropagation {}", "filler ".repeat(299));
        let cat = Categorizer::default().categorize(&content(&[], &text));

        assert_eq!(cat.primary_domain, None);
        assert_eq!(cat.secondary_domains, vec![SkillDomain::DeepLearning]);
        assert!(cat.tags.is_empty());
    }

    #[test]
    fn tags_are_capped() {
        let all_subtopics: Vec<&str> = TAXONOMY
            .iter()
            .flat_map(|n| n.subtopics.iter().copied())
            .collect();
        let c = content(&[], &format!("machine learning {}", all_subtopics.join(" ")));
        let cat = Categorizer::default().categorize(&c);
        assert!(cat.tags.len() <= MAX_TAGS);
    }
}
