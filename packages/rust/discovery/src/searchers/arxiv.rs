//! Preprint search through the arXiv Atom API. No credentials needed.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use trainingcatalog_fetch::Fetcher;
use trainingcatalog_shared::text::truncate_chars;
use trainingcatalog_shared::{Result, SearchResult, TrainingCatalogError};

use crate::searcher::{Searcher, SearcherKind};

const DEFAULT_BASE_URL: &str = "http://export.arxiv.org/api/query";

/// Snippet length taken from the abstract.
const SNIPPET_CHARS: usize = 500;

/// Searches for tutorial, survey and introduction papers.
pub struct ArxivSearcher {
    fetcher: Fetcher,
    base_url: String,
}

impl ArxivSearcher {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    /// Point at a different endpoint (mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn query_url(&self, query: &str, max_results: usize) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TrainingCatalogError::config(format!("bad arXiv base URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair(
                "search_query",
                &format!("all:{query} AND (ti:tutorial OR ti:survey OR ti:introduction)"),
            )
            .append_pair("start", "0")
            .append_pair("max_results", &max_results.to_string())
            .append_pair("sortBy", "relevance");
        Ok(url)
    }

    async fn try_search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let url = self.query_url(query, max_results)?;
        let resp = self.fetcher.get(url.as_str()).await?;
        if !resp.is_success() {
            warn!(status = resp.status, query, "arxiv search returned non-success status");
            return Ok(Vec::new());
        }

        let mut results: Vec<SearchResult> = parse_feed(&resp.body)
            .into_iter()
            .map(|entry| SearchResult {
                url: entry.id,
                title: entry.title,
                snippet: truncate_chars(&entry.summary, SNIPPET_CHARS).to_string(),
                source: self.name().to_string(),
                raw_metadata: json!({ "full_summary": entry.summary }),
            })
            .collect();
        results.truncate(max_results);
        Ok(results)
    }
}

#[async_trait]
impl Searcher for ArxivSearcher {
    fn name(&self) -> &str {
        "arxiv"
    }

    fn kind(&self) -> SearcherKind {
        SearcherKind::PreprintArchive
    }

    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        match self.try_search(query, max_results).await {
            Ok(results) => {
                debug!(query, count = results.len(), "arxiv search finished");
                results
            }
            Err(e) => {
                warn!(query, error = %e, "arxiv search failed");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Atom parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct FeedEntry {
    id: String,
    title: String,
    summary: String,
}

/// Extract `<entry>` elements with a non-empty `<id>` from an Atom feed.
fn parse_feed(xml: &str) -> Vec<FeedEntry> {
    static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<entry(?:\s[^>]*)?>(.*?)</entry>").expect("valid regex")
    });

    ENTRY_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let body = caps.get(1)?.as_str();
            let id = element_text(body, "id");
            if id.is_empty() {
                return None;
            }
            Some(FeedEntry {
                id,
                title: collapse_whitespace(&element_text(body, "title")),
                summary: element_text(body, "summary"),
            })
        })
        .collect()
}

/// Trimmed, entity-decoded text of the first `<tag>` child, or empty.
fn element_text(body: &str, tag: &str) -> String {
    static ELEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<(id|title|summary)(?:\s[^>]*)?>(.*?)</(?:id|title|summary)>")
            .expect("valid regex")
    });

    ELEMENT_RE
        .captures_iter(body)
        .find(|caps| &caps[1] == tag)
        .map(|caps| decode_entities(caps[2].trim()))
        .unwrap_or_default()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
