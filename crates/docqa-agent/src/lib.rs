//! The conversational layer over the retrieval pipeline: a blocking LLM
//! client, the document-QA agent and the LLM-as-judge evaluator.

pub mod agent;
pub mod judge;
pub mod llm;

pub use agent::{format_context, DocAgent, NO_RESULTS_MESSAGE, UNAVAILABLE_MESSAGE};
pub use judge::{judge_relevance, Judgement};
pub use llm::{LlmClient, OpenAiClient};
