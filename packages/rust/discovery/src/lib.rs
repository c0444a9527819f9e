//! Resource discovery: searchers, heuristic evaluation and the agent that
//! ties them to the catalog.
//!
//! A discovery run builds query sets from the skill taxonomy, fans them out to
//! every [`Searcher`] concurrently, deduplicates the hits by canonical URL,
//! scores each one with [`evaluate_at`] and upserts the survivors into the
//! [`CatalogStore`](trainingcatalog_storage::CatalogStore).

mod agent;
pub mod evaluator;
mod searcher;
pub mod searchers;

pub use agent::{DiscoveryAgent, DiscoveryReport, build_hands_on_queries, build_queries};
pub use evaluator::{ScoreBreakdown, evaluate, evaluate_at};
pub use searcher::{Searcher, SearcherKind, default_searchers};
