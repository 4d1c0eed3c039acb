use anyhow::Result;
use std::sync::Arc;

use docqa_core::traits::{Embedder, Retriever};
use docqa_core::types::{RetrieverKind, ScoredChunk};

use crate::store::ChunkStore;

/// Embedding-similarity retriever over one partition of the chunk store.
pub struct SemanticRetriever {
    store: Arc<ChunkStore>,
    partition: String,
    embedder: Arc<dyn Embedder>,
}

impl SemanticRetriever {
    pub fn new(store: Arc<ChunkStore>, partition: String, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, partition, embedder }
    }
}

impl Retriever for SemanticRetriever {
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query_vec = self.embedder.embed(query)?;
        let hits = self.store.query_top_k(&self.partition, &query_vec, k)?;
        Ok(hits
            .into_iter()
            .map(|(chunk, score)| ScoredChunk { chunk, score, origin: RetrieverKind::Semantic })
            .collect())
    }
}
