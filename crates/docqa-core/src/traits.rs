use crate::types::ScoredChunk;

/// A retrieval capability: ordered top-k candidates for a query.
///
/// Implementations must be deterministic for a fixed index and fixed
/// models, and must treat all state touched by `retrieve` as immutable
/// after construction so concurrent reads stay safe without locks.
pub trait Retriever: Send + Sync {
    fn retrieve(&self, query: &str, k: usize) -> anyhow::Result<Vec<ScoredChunk>>;
}

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()])?;
        anyhow::ensure!(!vectors.is_empty(), "embedder returned no vectors");
        Ok(vectors.remove(0))
    }
}

/// Cross-encoder relevance model: joint (query, passage) scoring, higher
/// is more relevant.
pub trait Reranker: Send + Sync {
    fn score_pairs(&self, query: &str, passages: &[String]) -> anyhow::Result<Vec<f32>>;
}
