use anyhow::Result;
use tracing::warn;

use docqa_core::traits::Retriever;
use docqa_core::types::Passage;
use docqa_hybrid::retrieve_passages;

use crate::llm::LlmClient;

/// Rendered instead of crashing when no retriever could be built.
pub const UNAVAILABLE_MESSAGE: &str = "The document search engine is not available. \
Check that the chunk index has been built (run the ingestion step) and that the \
configured partition exists.";

/// Rendered when retrieval succeeds but nothing clears the store's own
/// relevance thresholds. An ordinary answer, not a failure.
pub const NO_RESULTS_MESSAGE: &str =
    "No relevant information was found in the documents for this query.";

const SYSTEM_PROMPT: &str = "You are an application-security analyst answering \
questions about the OWASP Application Security Verification Standard. Answer only \
from the provided context. Structure every answer as: a direct answer first, then \
the exact supporting excerpts as quotations, then the sources consulted in the form \
(File: <source>, Page: <page>). If the context does not answer the question, say so.";

/// Render passages as a context block the model can cite from.
pub fn format_context(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| format!("Source: {}, Page: {}\n{}", p.source, p.page, p.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Question-answering agent over one built retrieval pipeline.
///
/// Both collaborators are optional: a failed factory build or a missing
/// API key degrades to ordinary answers instead of a crash.
pub struct DocAgent {
    retriever: Option<Box<dyn Retriever>>,
    llm: Option<Box<dyn LlmClient>>,
    retriever_k: usize,
}

impl DocAgent {
    pub fn new(
        retriever: Option<Box<dyn Retriever>>,
        llm: Option<Box<dyn LlmClient>>,
        retriever_k: usize,
    ) -> Self {
        Self { retriever, llm, retriever_k }
    }

    /// The search tool: cited context for a query, or a human-readable
    /// explanation of why there is none.
    pub fn search_context(&self, query: &str) -> String {
        let Some(retriever) = &self.retriever else {
            return UNAVAILABLE_MESSAGE.to_string();
        };
        let passages = match retrieve_passages(retriever.as_ref(), query, self.retriever_k) {
            Ok(passages) => passages,
            Err(err) => {
                warn!("retrieval failed for query: {err:#}");
                return UNAVAILABLE_MESSAGE.to_string();
            }
        };
        if passages.is_empty() {
            return NO_RESULTS_MESSAGE.to_string();
        }
        format_context(&passages)
    }

    pub fn answer(&self, question: &str) -> Result<String> {
        let context = self.search_context(question);
        match &self.llm {
            Some(llm) => {
                let prompt = format!("Context:\n{}\n\nQuestion: {}", context, question);
                llm.generate(SYSTEM_PROMPT, &prompt)
            }
            None => {
                warn!("no LLM configured; returning retrieved context directly");
                Ok(context)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::types::{Chunk, RetrieverKind, ScoredChunk};

    struct StaticRetriever {
        hits: Vec<ScoredChunk>,
    }

    impl Retriever for StaticRetriever {
        fn retrieve(&self, _query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
            Ok(self.hits.iter().take(k).cloned().collect())
        }
    }

    fn hit(text: &str, page: u32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                id: format!("p{page}"),
                text: text.to_string(),
                source: "asvs.pdf".to_string(),
                page,
            },
            score: 1.0,
            origin: RetrieverKind::Reranked,
        }
    }

    #[test]
    fn no_retriever_renders_the_unavailable_answer() {
        let agent = DocAgent::new(None, None, 4);
        assert_eq!(agent.search_context("anything"), UNAVAILABLE_MESSAGE);
        let answer = agent.answer("anything").expect("answer");
        assert_eq!(answer, UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn empty_retrieval_renders_the_no_results_answer() {
        let agent =
            DocAgent::new(Some(Box::new(StaticRetriever { hits: Vec::new() })), None, 4);
        assert_eq!(agent.search_context("anything"), NO_RESULTS_MESSAGE);
    }

    #[test]
    fn context_cites_source_and_page() {
        let agent = DocAgent::new(
            Some(Box::new(StaticRetriever {
                hits: vec![hit("MFA is required for admins.", 10), hit("Passwords are long.", 5)],
            })),
            None,
            4,
        );
        let context = agent.search_context("mfa");
        assert!(context.contains("Source: asvs.pdf, Page: 10"));
        assert!(context.contains("MFA is required for admins."));
        assert!(context.contains("\n\n---\n\n"), "passages are separated");
    }
}
