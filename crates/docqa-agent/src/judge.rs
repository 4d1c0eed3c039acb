use tracing::warn;

use docqa_core::types::Passage;

use crate::llm::LlmClient;

const JUDGE_SYSTEM: &str = "You evaluate whether context documents contain the \
answer to a user question. Be strict: the context must answer the question \
directly; merely mentioning keywords is not enough. Reply with exactly \"true\" \
or \"false\".";

#[derive(Debug, Clone)]
pub struct Judgement {
    pub is_relevant: bool,
    pub raw_response: String,
}

/// Judge whether the retrieved passages suffice to answer the question.
/// Prefers the LLM judge; when it is unavailable, falls back to a
/// deterministic term-containment heuristic so evaluation runs offline.
pub fn judge_relevance(
    llm: Option<&dyn LlmClient>,
    question: &str,
    passages: &[Passage],
) -> Judgement {
    if let Some(llm) = llm {
        let context =
            passages.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join("\n---\n");
        let prompt = format!(
            "User question: \"{}\"\n\nRetrieved context documents:\n---\n{}\n---\n\n\
             Is the context relevant and sufficient to answer the question? \
             Answer ONLY \"true\" or \"false\".",
            question, context
        );
        match llm.generate(JUDGE_SYSTEM, &prompt) {
            Ok(response) => {
                return Judgement {
                    is_relevant: response.to_lowercase().contains("true"),
                    raw_response: response,
                }
            }
            Err(err) => {
                warn!("LLM judge unavailable: {err:#}; using term-containment heuristic");
            }
        }
    }
    heuristic_judgement(question, passages)
}

/// A passage is relevant when it contains every question term longer than
/// three characters.
fn heuristic_judgement(question: &str, passages: &[Passage]) -> Judgement {
    let terms: Vec<String> = question
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.len() > 3)
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|t| !t.is_empty())
        .collect();
    let is_relevant = !terms.is_empty()
        && passages.iter().any(|p| {
            let text = p.text.to_lowercase();
            terms.iter().all(|t| text.contains(t.as_str()))
        });
    Judgement { is_relevant, raw_response: "fallback_heuristic".to_string() }
}
