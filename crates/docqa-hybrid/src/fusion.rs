use anyhow::Result;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::warn;

use docqa_core::error::Error;
use docqa_core::traits::Retriever;
use docqa_core::types::{Chunk, ChunkId, RetrieverKind, ScoredChunk};

/// Rank-weighted ensemble over sub-retrievers.
///
/// Raw scores are never compared across retriever kinds; each
/// sub-retriever only contributes through the positions of its results.
/// A hit at 1-based rank r under weight w adds `w / (rrf_k + r)`, and
/// contributions for the same chunk id are summed.
pub struct FusionRetriever {
    parts: Vec<(Box<dyn Retriever>, f32)>,
    fetch_k: usize,
    rrf_k: usize,
}

impl FusionRetriever {
    /// `fetch_k` is what each sub-retriever is asked for, intentionally
    /// larger than the final k so the re-ranker has material to work with.
    pub fn new(parts: Vec<(Box<dyn Retriever>, f32)>, fetch_k: usize, rrf_k: usize) -> Result<Self> {
        if parts.is_empty() {
            return Err(Error::InvalidConfig(
                "fusion retriever needs at least one sub-retriever".to_string(),
            )
            .into());
        }
        Ok(Self { parts, fetch_k, rrf_k })
    }
}

impl Retriever for FusionRetriever {
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let mut merged: HashMap<ChunkId, (Chunk, f64)> = HashMap::new();
        let mut alive = 0usize;
        let mut last_err: Option<anyhow::Error> = None;

        for (retriever, weight) in &self.parts {
            match retriever.retrieve(query, self.fetch_k) {
                Ok(hits) => {
                    alive += 1;
                    for (position, hit) in hits.into_iter().enumerate() {
                        let rank = position + 1;
                        let contribution = f64::from(*weight) / (self.rrf_k as f64 + rank as f64);
                        merged
                            .entry(hit.chunk.id.clone())
                            .and_modify(|(_, score)| *score += contribution)
                            .or_insert((hit.chunk, contribution));
                    }
                }
                Err(err) => {
                    warn!("sub-retriever failed for this query, continuing with survivors: {err:#}");
                    last_err = Some(err);
                }
            }
        }

        if alive == 0 {
            return Err(last_err
                .unwrap_or_else(|| Error::Operation("all sub-retrievers failed".to_string()).into()));
        }

        let mut fused: Vec<ScoredChunk> = merged
            .into_values()
            .map(|(chunk, score)| ScoredChunk {
                chunk,
                score: score as f32,
                origin: RetrieverKind::Fused,
            })
            .collect();
        fused.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        fused.truncate(k);
        Ok(fused)
    }
}
