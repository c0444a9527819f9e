//! Web search through the Google Custom Search JSON API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use trainingcatalog_fetch::Fetcher;
use trainingcatalog_shared::{Result, SearchResult, TrainingCatalogError};

use crate::searcher::{Searcher, SearcherKind};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// The API serves at most this many items per page.
const PAGE_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// Google Programmable Search. Needs both an API key and an engine id.
pub struct GoogleSearcher {
    fetcher: Fetcher,
    api_key: Option<String>,
    engine_id: Option<String>,
    base_url: String,
}

impl GoogleSearcher {
    pub fn new(fetcher: Fetcher, api_key: Option<String>, engine_id: Option<String>) -> Self {
        Self {
            fetcher,
            api_key,
            engine_id,
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    /// Point at a different endpoint (mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn page_url(&self, key: &str, cx: &str, query: &str, start: usize, num: usize) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TrainingCatalogError::config(format!("bad Google base URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("key", key)
            .append_pair("cx", cx)
            .append_pair("q", query)
            .append_pair("start", &start.to_string())
            .append_pair("num", &num.to_string());
        Ok(url)
    }

    async fn paged_search(
        &self,
        key: &str,
        cx: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>> {
        let mut results = Vec::new();
        let mut start = 1;

        while results.len() < max_results {
            let num = (max_results - results.len()).min(PAGE_SIZE);
            let url = self.page_url(key, cx, query, start, num)?;
            let resp = self.fetcher.get(url.as_str()).await?;
            if !resp.is_success() {
                warn!(status = resp.status, query, "google search returned non-success status");
                break;
            }

            let page: SearchPage = resp.json()?;
            if page.items.is_empty() {
                break;
            }

            for item in page.items {
                let field = |name: &str| {
                    item.get(name)
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string()
                };
                let link = field("link");
                if link.is_empty() {
                    continue;
                }
                let title = field("title");
                let snippet = field("snippet");
                results.push(SearchResult {
                    url: link,
                    title,
                    snippet,
                    source: self.name().to_string(),
                    raw_metadata: item,
                });
            }
            start += PAGE_SIZE;
        }

        results.truncate(max_results);
        Ok(results)
    }
}

#[async_trait]
impl Searcher for GoogleSearcher {
    fn name(&self) -> &str {
        "google"
    }

    fn kind(&self) -> SearcherKind {
        SearcherKind::WebSearch
    }

    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        let (Some(key), Some(cx)) = (self.api_key.as_deref(), self.engine_id.as_deref()) else {
            warn!("Google API credentials not configured, skipping web search");
            return Vec::new();
        };

        match self.paged_search(key, cx, query, max_results).await {
            Ok(results) => {
                debug!(query, count = results.len(), "google search finished");
                results
            }
            Err(e) => {
                warn!(query, error = %e, "google search failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trainingcatalog_shared::Settings;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        let settings = Settings {
            rate_limit_per_second: 0.0,
            ..Settings::default()
        };
        Fetcher::new(&settings).unwrap()
    }

    fn items(range: std::ops::Range<usize>) -> serde_json::Value {
        let items: Vec<_> = range
            .map(|i| {
                json!({
                    "link": format!("https://site{i}.example/course"),
                    "title": format!("Course {i}"),
                    "snippet": "A free machine learning course",
                })
            })
            .collect();
        json!({ "items": items })
    }

    #[tokio::test]
    async fn missing_credentials_yield_nothing() {
        let searcher = GoogleSearcher::new(fetcher(), Some("key".into()), None);
        assert!(searcher.search("ml", 10).await.is_empty());
    }

    #[tokio::test]
    async fn pages_until_max_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("start", "1"))
            .and(query_param("q", "learn ml"))
            .and(query_param("cx", "engine"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items(0..10)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("start", "11"))
            .and(query_param("num", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items(10..15)))
            .expect(1)
            .mount(&server)
            .await;

        let searcher = GoogleSearcher::new(fetcher(), Some("key".into()), Some("engine".into()))
            .with_base_url(server.uri());
        let results = searcher.search("learn ml", 15).await;
        assert_eq!(results.len(), 15);
        assert_eq!(results[0].source, "google");
        assert_eq!(results[14].url, "https://site14.example/course");
        assert_eq!(results[0].raw_metadata["title"], "Course 0");
    }

    #[tokio::test]
    async fn stops_on_empty_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("start", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items(0..3)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("start", "11"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let searcher = GoogleSearcher::new(fetcher(), Some("k".into()), Some("c".into()))
            .with_base_url(server.uri());
        assert_eq!(searcher.search("x", 30).await.len(), 3);
    }

    #[tokio::test]
    async fn error_status_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let searcher = GoogleSearcher::new(fetcher(), Some("k".into()), Some("c".into()))
            .with_base_url(server.uri());
        assert!(searcher.search("x", 10).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let searcher = GoogleSearcher::new(fetcher(), Some("k".into()), Some("c".into()))
            .with_base_url(server.uri());
        assert!(searcher.search("x", 10).await.is_empty());
    }
}
