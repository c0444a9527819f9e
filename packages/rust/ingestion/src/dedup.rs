//! Near-duplicate detection over scraped content.
//!
//! Documents are compared pairwise by Jaccard similarity of their trigram
//! sets (first 5000 characters only). Pairs at or above the threshold are
//! merged with a union-find; every resulting cluster of two or more
//! documents becomes a [`DuplicateGroup`].

use std::collections::{HashMap, HashSet};

use tracing::debug;

use trainingcatalog_shared::text::{jaccard, round_to, trigrams, truncate_chars};
use trainingcatalog_shared::{DuplicateGroup, ScrapedContent};

pub const DEFAULT_THRESHOLD: f64 = 0.85;

/// Only this prefix of each document is shingled.
const SHINGLE_PREFIX_CHARS: usize = 5_000;

#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    threshold: f64,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl Deduplicator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Group near-identical documents. The member with the most headings is
    /// the canonical one; the others are listed as duplicates in input order.
    pub fn find_duplicates(&self, contents: &[ScrapedContent]) -> Vec<DuplicateGroup> {
        if contents.len() < 2 {
            return Vec::new();
        }

        let shingles: Vec<HashSet<String>> = contents
            .iter()
            .map(|c| trigrams(truncate_chars(&c.text, SHINGLE_PREFIX_CHARS)))
            .collect();

        let n = contents.len();
        let mut similarity = vec![vec![0.0; n]; n];
        let mut sets = DisjointSet::default();
        for i in 0..n {
            for j in (i + 1)..n {
                let sim = jaccard(&shingles[i], &shingles[j]);
                similarity[i][j] = sim;
                similarity[j][i] = sim;
                if sim >= self.threshold {
                    sets.union(i, j, |k| contents[k].headings.len());
                }
            }
        }

        // Members per root, in order of first appearance.
        let mut order: Vec<usize> = Vec::new();
        let mut clusters: HashMap<usize, Vec<usize>> = HashMap::new();
        for i in 0..n {
            let root = sets.find(i);
            let members = clusters.entry(root).or_default();
            if members.is_empty() {
                order.push(root);
            }
            members.push(i);
        }

        let groups: Vec<DuplicateGroup> = order
            .into_iter()
            .filter_map(|root| {
                let members = clusters.remove(&root)?;
                if members.len() < 2 {
                    return None;
                }
                Some(DuplicateGroup {
                    canonical_id: contents[root].resource_id.clone(),
                    duplicate_ids: members
                        .iter()
                        .filter(|&&m| m != root)
                        .map(|&m| contents[m].resource_id.clone())
                        .collect(),
                    similarity: round_to(mean_pairwise(&members, &similarity), 4),
                })
            })
            .collect();

        debug!(documents = n, groups = groups.len(), "duplicate detection done");
        groups
    }
}

fn mean_pairwise(members: &[usize], similarity: &[Vec<f64>]) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (idx, &a) in members.iter().enumerate() {
        for &b in &members[idx + 1..] {
            total += similarity[a][b];
            pairs += 1;
        }
    }
    if pairs == 0 { 0.0 } else { total / pairs as f64 }
}

/// Map-backed union-find over document indices.
#[derive(Debug, Default)]
struct DisjointSet {
    parent: HashMap<usize, usize>,
}

impl DisjointSet {
    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while let Some(&p) = self.parent.get(&root) {
            if p == root {
                break;
            }
            root = p;
        }
        // Path compression.
        let mut cur = x;
        while cur != root {
            let next = self.parent.get(&cur).copied().unwrap_or(root);
            self.parent.insert(cur, root);
            cur = next;
        }
        root
    }

    /// Merge the sets of `a` and `b`. The root with the larger weight wins;
    /// on a tie the root of `a` stays.
    fn union(&mut self, a: usize, b: usize, weight: impl Fn(usize) -> usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        if weight(ra) >= weight(rb) {
            self.parent.insert(rb, ra);
        } else {
            self.parent.insert(ra, rb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(id: &str, text: &str, headings: usize) -> ScrapedContent {
        ScrapedContent {
            resource_id: id.into(),
            url: format!("https://example.com/{id}"),
            text: text.into(),
            headings: (0..headings).map(|i| format!("h{i}")).collect(),
            code_blocks: vec![],
            links: vec![],
            content_hash: String::new(),
            word_count: text.split_whitespace().count(),
            scraped_at: Utc::now(),
        }
    }

    const LESSON: &str = "Gradient descent iteratively updates model parameters in the \
        direction of the negative gradient of the loss function. The learning rate \
        controls the step size and must be tuned carefully to avoid divergence.";

    #[test]
    fn fewer_than_two_documents() {
        let dedup = Deduplicator::default();
        assert!(dedup.find_duplicates(&[]).is_empty());
        assert!(dedup.find_duplicates(&[doc("a", LESSON, 1)]).is_empty());
    }

    #[test]
    fn mirrors_are_grouped_under_the_richest_copy() {
        let mirror = format!("{LESSON}!");
        let docs = vec![
            doc("a", LESSON, 1),
            doc("b", &mirror, 5),
            doc("c", "Transformers use self-attention to model token interactions.", 3),
        ];

        let groups = Deduplicator::default().find_duplicates(&docs);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].canonical_id, "b");
        assert_eq!(groups[0].duplicate_ids, vec!["a"]);
        assert!(groups[0].similarity >= DEFAULT_THRESHOLD);
    }

    #[test]
    fn equal_headings_keep_the_first_document() {
        let docs = vec![doc("a", LESSON, 2), doc("b", LESSON, 2), doc("c", LESSON, 2)];
        let groups = Deduplicator::default().find_duplicates(&docs);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].canonical_id, "a");
        assert_eq!(groups[0].duplicate_ids, vec!["b", "c"]);
        assert_eq!(groups[0].similarity, 1.0);
    }

    #[test]
    fn threshold_is_inclusive() {
        let docs = vec![doc("a", "abcd", 0), doc("b", "abce", 0)];
        // {abc, bcd} vs {abc, bce}: 1 / 3
        assert!(Deduplicator::new(0.34).find_duplicates(&docs).is_empty());
        assert_eq!(Deduplicator::new(1.0 / 3.0).find_duplicates(&docs).len(), 1);
    }

    #[test]
    fn only_prefix_is_compared() {
        let shared = "x".repeat(SHINGLE_PREFIX_CHARS);
        let a = format!("{shared} alpha beta gamma");
        let b = format!("{shared} completely different tail");
        let groups = Deduplicator::default().find_duplicates(&[doc("a", &a, 0), doc("b", &b, 0)]);
        assert_eq!(groups.len(), 1);
    }
}
