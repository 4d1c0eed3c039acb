//! Domain types shared by the lexical, semantic and fusion retrievers.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// An immutable unit of retrievable text produced by offline ingestion.
///
/// - `id`: stable within one index build, unique across the partition;
///   fusion deduplicates by it
/// - `text`: the chunk content
/// - `source`: originating document identifier (file name)
/// - `page`: originating page number, 1-indexed in persisted form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub source: String,
    pub page: u32,
}

/// Which retriever produced a candidate. Closed set; dispatch goes through
/// the `Retriever` trait, this tag only labels results for logging and
/// evaluation output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RetrieverKind {
    Lexical,
    Semantic,
    Fused,
    Reranked,
}

/// One retriever's scored candidate for one query.
///
/// `score` semantics differ per `origin` (term overlap vs. vector
/// similarity vs. fused rank mass vs. cross-encoder relevance); scores are
/// never compared across origins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
    pub origin: RetrieverKind,
}

/// The caller-facing projection of a retrieval result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    pub source: String,
    pub page: u32,
}

impl From<ScoredChunk> for Passage {
    fn from(hit: ScoredChunk) -> Self {
        Passage { text: hit.chunk.text, source: hit.chunk.source, page: hit.chunk.page }
    }
}
