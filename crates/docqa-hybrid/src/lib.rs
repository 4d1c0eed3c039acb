//! Hybrid retrieval: rank-weighted fusion of the lexical and semantic
//! retrievers, cross-encoder re-ranking, and the factory that wires the
//! pipeline together with its fallback ladder.

pub mod factory;
pub mod fusion;
pub mod rerank;

pub use factory::RetrieverFactory;
pub use fusion::FusionRetriever;
pub use rerank::RerankingRetriever;

use docqa_core::traits::Retriever;
use docqa_core::types::Passage;

/// Caller-facing surface: cited passages, best first. "No results" is a
/// valid terminal state, never an error.
pub fn retrieve_passages(
    retriever: &dyn Retriever,
    query: &str,
    k: usize,
) -> anyhow::Result<Vec<Passage>> {
    Ok(retriever.retrieve(query, k)?.into_iter().map(Passage::from).collect())
}
