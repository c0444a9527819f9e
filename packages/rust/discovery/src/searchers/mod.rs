//! Built-in [`Searcher`](crate::Searcher) implementations.

mod arxiv;
mod github;
mod google;

pub use arxiv::ArxivSearcher;
pub use github::GitHubSearcher;
pub use google::GoogleSearcher;
