//! Text normalization and similarity helpers shared by scoring,
//! deduplication and categorization.

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};

/// Lowercase, replace everything outside `[a-z0-9]` and whitespace with a
/// space, collapse whitespace runs and trim.
///
/// The output is always ASCII.
pub fn normalise(text: &str) -> String {
    let replaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Set of character trigrams of the normalized text. Texts shorter than
/// three characters yield a singleton of the whole (normalized) text.
pub fn trigrams(text: &str) -> HashSet<String> {
    let t = normalise(text);
    if t.len() < 3 {
        return HashSet::from([t]);
    }
    // `normalise` output is ASCII, so byte windows are char windows.
    t.as_bytes()
        .windows(3)
        .map(|w| String::from_utf8_lossy(w).into_owned())
        .collect()
}

/// Jaccard similarity of two sets. Two empty sets are identical.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Hex-encoded SHA-256 of `input`.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// SHA-256 of the normalized text.
pub fn content_hash(text: &str) -> String {
    sha256_hex(&normalise(text))
}

/// Term-frequency relevance of `text` against `keywords`, in `[0, 1]`.
///
/// Single-word keywords count word occurrences; multi-word keywords count
/// non-overlapping substring occurrences in the normalized text. The hit
/// ratio is scaled by 10 and clamped.
pub fn keyword_score<S: AsRef<str>>(text: &str, keywords: &[S]) -> f64 {
    let joined = normalise(text);
    let mut word_counts: HashMap<&str, usize> = HashMap::new();
    for word in joined.split(' ').filter(|w| !w.is_empty()) {
        *word_counts.entry(word).or_default() += 1;
    }
    let total = word_counts.values().sum::<usize>().max(1);

    let mut hits = 0usize;
    for kw in keywords {
        let kw = normalise(kw.as_ref());
        if kw.is_empty() {
            continue;
        }
        if kw.contains(' ') {
            hits += joined.matches(kw.as_str()).count();
        } else {
            hits += word_counts.get(kw.as_str()).copied().unwrap_or(0);
        }
    }

    (hits as f64 / total as f64 * 10.0).min(1.0)
}

/// First `n` characters of `text` (not bytes).
pub fn truncate_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Round to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalise_strips_punctuation_and_case() {
        assert_eq!(normalise("  Hello, World!\n\tCI/CD  "), "hello world ci cd");
        assert_eq!(normalise("scikit-learn"), "scikit learn");
        assert_eq!(normalise("Ünïcode"), "n code");
        assert_eq!(normalise("!!!"), "");
    }

    #[test]
    fn trigram_sets() {
        let t = trigrams("abcd");
        assert_eq!(t.len(), 2);
        assert!(t.contains("abc") && t.contains("bcd"));

        assert_eq!(trigrams("ab"), HashSet::from(["ab".to_string()]));
        assert_eq!(trigrams(""), HashSet::from([String::new()]));
    }

    #[test]
    fn jaccard_bounds() {
        let empty = HashSet::new();
        assert_eq!(jaccard(&empty, &empty), 1.0);

        let a = trigrams("machine learning");
        assert_eq!(jaccard(&a, &a), 1.0);
        assert_eq!(jaccard(&a, &empty), 0.0);

        let b = trigrams("zzzz qqqq");
        assert_eq!(jaccard(&a, &b), 0.0);
    }

    #[test]
    fn keyword_score_counts_words_and_phrases() {
        // 4 words, 1 single-word hit + 1 phrase hit -> 2/4 * 10 clamps to 1.0
        assert_eq!(keyword_score("machine learning regression intro", &["regression", "machine learning"]), 1.0);

        // 20 words with one hit -> 1/20 * 10 = 0.5
        let text = format!("regression {}", "filler ".repeat(19));
        assert!((keyword_score(&text, &["regression"]) - 0.5).abs() < 1e-9);

        assert_eq!(keyword_score("", &["regression"]), 0.0);
        assert_eq!(keyword_score("nothing relevant here", &["regression"]), 0.0);
    }

    #[test]
    fn content_hash_ignores_formatting() {
        assert_eq!(content_hash("Hello   World"), content_hash("hello, world!"));
        assert_eq!(content_hash("x").len(), 64);
    }

    #[test]
    fn truncation_and_rounding() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(round_to(0.123456, 3), 0.123);
        assert_eq!(round_to(2.449, 1), 2.4);
    }
}
