//! Code-hosting search through the GitHub repository search API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use trainingcatalog_fetch::Fetcher;
use trainingcatalog_shared::{Result, SearchResult, TrainingCatalogError};

use crate::searcher::{Searcher, SearcherKind};

const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// GitHub caps `per_page` at 100.
const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct RepoSearch {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    license: Option<RepoLicense>,
}

#[derive(Debug, Deserialize)]
struct RepoLicense {
    #[serde(default)]
    spdx_id: Option<String>,
}

/// Repository search. A token is optional and only raises rate limits.
pub struct GitHubSearcher {
    fetcher: Fetcher,
    token: Option<String>,
    base_url: String,
}

impl GitHubSearcher {
    pub fn new(fetcher: Fetcher, token: Option<String>) -> Self {
        Self {
            fetcher,
            token,
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    /// Point at a different API root (mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_url(&self, query: &str, max_results: usize) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/search/repositories"))
            .map_err(|e| TrainingCatalogError::config(format!("bad GitHub base URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("q", &format!("{query} in:name,description,readme"))
            .append_pair("sort", "stars")
            .append_pair("order", "desc")
            .append_pair("per_page", &max_results.clamp(1, MAX_PER_PAGE).to_string());
        Ok(url)
    }

    async fn try_search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let url = self.search_url(query, max_results)?;
        let bearer = self.token.as_ref().map(|t| format!("Bearer {t}"));
        let mut headers = vec![("Accept", "application/vnd.github+json")];
        if let Some(auth) = bearer.as_deref() {
            headers.push(("Authorization", auth));
        }

        let resp = self.fetcher.fetch(url.as_str(), &headers).await?;
        if !resp.is_success() {
            warn!(status = resp.status, query, "github search returned non-success status");
            return Ok(Vec::new());
        }

        let body: RepoSearch = resp.json()?;
        Ok(body
            .items
            .into_iter()
            .filter(|repo| !repo.html_url.is_empty())
            .take(max_results)
            .map(|repo| {
                let license = repo.license.and_then(|l| l.spdx_id);
                SearchResult {
                    url: repo.html_url,
                    title: repo.full_name,
                    snippet: repo.description.unwrap_or_default(),
                    source: self.name().to_string(),
                    raw_metadata: json!({
                        "stars": repo.stargazers_count,
                        "language": repo.language.unwrap_or_default(),
                        "topics": repo.topics,
                        "updated_at": repo.updated_at.unwrap_or_default(),
                        "license": license,
                    }),
                }
            })
            .collect())
    }
}

#[async_trait]
impl Searcher for GitHubSearcher {
    fn name(&self) -> &str {
        "github"
    }

    fn kind(&self) -> SearcherKind {
        SearcherKind::CodeHosting
    }

    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        match self.try_search(query, max_results).await {
            Ok(results) => {
                debug!(query, count = results.len(), "github search finished");
                results
            }
            Err(e) => {
                warn!(query, error = %e, "github search failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trainingcatalog_shared::Settings;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        let settings = Settings {
            rate_limit_per_second: 0.0,
            ..Settings::default()
        };
        Fetcher::new(&settings).unwrap()
    }

    fn body() -> serde_json::Value {
        json!({
            "total_count": 2,
            "items": [
                {
                    "html_url": "https://github.com/fastai/course22",
                    "full_name": "fastai/course22",
                    "description": "The fast.ai course notebooks",
                    "stargazers_count": 1200,
                    "language": "Jupyter Notebook",
                    "topics": ["deep-learning"],
                    "updated_at": "2025-01-01T00:00:00Z",
                    "license": { "spdx_id": "Apache-2.0" }
                },
                {
                    "html_url": "https://github.com/someone/notes",
                    "full_name": "someone/notes",
                    "description": null,
                    "stargazers_count": 3,
                    "language": null,
                    "license": null
                }
            ]
        })
    }

    #[tokio::test]
    async fn parses_repositories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/repositories"))
            .and(query_param("q", "deep learning in:name,description,readme"))
            .and(query_param("sort", "stars"))
            .and(query_param("per_page", "5"))
            .and(header("accept", "application/vnd.github+json"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body()))
            .expect(1)
            .mount(&server)
            .await;

        let searcher = GitHubSearcher::new(fetcher(), Some("tok".into())).with_base_url(server.uri());
        let results = searcher.search("deep learning", 5).await;
        assert_eq!(results.len(), 2);

        let first = &results[0];
        assert_eq!(first.title, "fastai/course22");
        assert_eq!(first.source, "github");
        assert_eq!(first.raw_metadata["stars"], 1200);
        assert_eq!(first.raw_metadata["license"], "Apache-2.0");
        assert_eq!(first.raw_metadata["updated_at"], "2025-01-01T00:00:00Z");

        assert_eq!(results[1].snippet, "");
        assert!(results[1].raw_metadata["license"].is_null());
    }

    #[tokio::test]
    async fn truncates_to_max_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body()))
            .mount(&server)
            .await;

        let searcher = GitHubSearcher::new(fetcher(), None).with_base_url(server.uri());
        assert_eq!(searcher.search("x", 1).await.len(), 1);
    }

    #[tokio::test]
    async fn rate_limited_response_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let searcher = GitHubSearcher::new(fetcher(), None).with_base_url(server.uri());
        assert!(searcher.search("x", 10).await.is_empty());
    }
}
