//! The searcher capability and the registry of built-in searchers.

use std::sync::Arc;

use async_trait::async_trait;

use trainingcatalog_fetch::Fetcher;
use trainingcatalog_shared::{Credentials, SearchResult};

use crate::searchers::{ArxivSearcher, GitHubSearcher, GoogleSearcher};

/// What sort of source a searcher queries. The agent uses this to route the
/// hands-on query set to code hosts only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearcherKind {
    /// General web search engine.
    WebSearch,
    /// Source-code hosting platform.
    CodeHosting,
    /// Academic preprint archive.
    PreprintArchive,
}

/// A search backend.
///
/// Implementations isolate their own failures: transport errors, bad status
/// codes and malformed payloads are logged and produce an empty result set.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Short, stable name recorded as the `source` of every result.
    fn name(&self) -> &str;

    fn kind(&self) -> SearcherKind;

    /// Run `query`, returning at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult>;
}

/// The three built-in searchers sharing one fetcher.
pub fn default_searchers(fetcher: &Fetcher, credentials: &Credentials) -> Vec<Arc<dyn Searcher>> {
    vec![
        Arc::new(GoogleSearcher::new(
            fetcher.clone(),
            credentials.google_api_key.clone(),
            credentials.google_cse_id.clone(),
        )),
        Arc::new(GitHubSearcher::new(
            fetcher.clone(),
            credentials.github_token.clone(),
        )),
        Arc::new(ArxivSearcher::new(fetcher.clone())),
    ]
}
