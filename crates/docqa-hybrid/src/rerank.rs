use anyhow::Result;
use std::cmp::Ordering;
use tracing::warn;

use docqa_core::traits::{Reranker, Retriever};
use docqa_core::types::{RetrieverKind, ScoredChunk};

/// Final-stage precision filter: pulls the fused candidate pool, scores
/// every (query, text) pair with the cross-encoder and keeps the top k.
///
/// Scoring failure at query time falls back to the fused order; retrieval
/// must never become unavailable because of the re-ranker.
pub struct RerankingRetriever {
    base: Box<dyn Retriever>,
    model: Box<dyn Reranker>,
    pool_k: usize,
}

impl RerankingRetriever {
    pub fn new(base: Box<dyn Retriever>, model: Box<dyn Reranker>, pool_k: usize) -> Self {
        Self { base, model, pool_k }
    }
}

impl Retriever for RerankingRetriever {
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let mut pool = self.base.retrieve(query, self.pool_k.max(k))?;
        if pool.is_empty() {
            return Ok(pool);
        }
        let texts: Vec<String> = pool.iter().map(|hit| hit.chunk.text.clone()).collect();
        match self.model.score_pairs(query, &texts) {
            Ok(scores) => {
                let mut rescored: Vec<ScoredChunk> = pool
                    .into_iter()
                    .zip(scores)
                    .map(|(hit, score)| ScoredChunk {
                        chunk: hit.chunk,
                        score,
                        origin: RetrieverKind::Reranked,
                    })
                    .collect();
                rescored.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.chunk.id.cmp(&b.chunk.id))
                });
                rescored.truncate(k);
                Ok(rescored)
            }
            Err(err) => {
                warn!("cross-encoder scoring failed, returning fused order: {err:#}");
                pool.truncate(k);
                Ok(pool)
            }
        }
    }
}
