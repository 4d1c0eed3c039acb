use anyhow::Result;
use std::collections::HashMap;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{doc, Index, IndexReader, TantivyDocument};

use docqa_core::error::Error;
use docqa_core::traits::Retriever;
use docqa_core::types::{Chunk, ChunkId, RetrieverKind, ScoredChunk};

use crate::tantivy_utils::{build_schema, register_tokenizer};

/// Sparse term-overlap retriever over one partition's full chunk
/// collection. The index lives in RAM and is built exactly once, at
/// construction; queries never mutate it.
pub struct LexicalRetriever {
    index: Index,
    reader: IndexReader,
    id_field: tantivy::schema::Field,
    text_field: tantivy::schema::Field,
    by_id: HashMap<ChunkId, (usize, Chunk)>,
}

impl LexicalRetriever {
    /// Builds the index over every chunk of the active partition. Zero
    /// chunks means ingestion never ran for this partition: that is a
    /// configuration error, not a valid empty index.
    pub fn new(chunks: Vec<Chunk>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::InvalidConfig(
                "lexical index over zero chunks; run ingestion for this partition".to_string(),
            )
            .into());
        }
        let schema = build_schema();
        let index = Index::create_in_ram(schema.clone());
        register_tokenizer(&index);
        let id_field = schema.get_field("id")?;
        let text_field = schema.get_field("text")?;
        let mut writer = index.writer(50_000_000)?;
        for chunk in &chunks {
            writer.add_document(doc!(
                id_field => chunk.id.clone(),
                text_field => chunk.text.clone(),
            ))?;
        }
        writer.commit()?;
        let reader = index.reader()?;
        let by_id = chunks
            .into_iter()
            .enumerate()
            .map(|(ordinal, chunk)| (chunk.id.clone(), (ordinal, chunk)))
            .collect();
        Ok(Self { index, reader, id_field, text_field, by_id })
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Retriever for LexicalRetriever {
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.text_field]);
        // Lenient parse: question punctuation must not turn into a
        // query-time error for the whole lexical leg.
        let (parsed, parse_errors) = parser.parse_query_lenient(query);
        if !parse_errors.is_empty() {
            tracing::debug!("lexical query parsed leniently: {:?}", parse_errors);
        }
        let top_docs = searcher.search(&parsed, &TopDocs::with_limit(k))?;
        let mut ranked: Vec<(f32, usize, Chunk)> = Vec::new();
        for (score, addr) in top_docs {
            let doc: TantivyDocument = searcher.doc(addr)?;
            let id = doc.get_first(self.id_field).and_then(|v| v.as_str()).unwrap_or("").to_string();
            if let Some((ordinal, chunk)) = self.by_id.get(&id) {
                ranked.push((score, *ordinal, chunk.clone()));
            }
        }
        // Equal scores keep original collection order
        ranked.sort_by(|a, b| {
            b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1))
        });
        Ok(ranked
            .into_iter()
            .map(|(score, _, chunk)| ScoredChunk { chunk, score, origin: RetrieverKind::Lexical })
            .collect())
    }
}
