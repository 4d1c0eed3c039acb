//! Cross-encoder relevance model.
//!
//! Scores a (query, passage) pair jointly with an XLM-RoBERTa
//! sequence-classification head (the architecture of the bge-reranker
//! family) and squashes the single logit through a sigmoid.

use anyhow::Result;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_transformers::models::xlm_roberta::XLMRobertaForSequenceClassification;
use tokenizers::Tokenizer;
use tracing::info;

use docqa_core::traits::Reranker;

use crate::tokenize::tokenize_pair_on_device;
use crate::{env_flag, load_tokenizer_and_config, load_varbuilder, model_dir_for, select_device};

const RERANK_MAX_LEN: usize = 512;

pub struct CrossEncoder {
    model: XLMRobertaForSequenceClassification,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
}

impl CrossEncoder {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!("loading cross-encoder from {}", model_dir.display());
        let (tokenizer, config) = load_tokenizer_and_config(model_dir)?;
        let vb = load_varbuilder(model_dir, &device)?;
        let model = XLMRobertaForSequenceClassification::new(1, &config, vb)?;
        Ok(Self { model, tokenizer, device, max_len: RERANK_MAX_LEN })
    }

    fn score_one(&self, query: &str, passage: &str) -> Result<f32> {
        let (input_ids, attention_mask) =
            tokenize_pair_on_device(&self.tokenizer, query, passage, self.max_len, &self.device)?;
        let token_type_ids = Tensor::zeros((1, self.max_len), DType::I64, &self.device)?;
        let logits = self.model.forward(&input_ids, &attention_mask, &token_type_ids)?;
        let logit = logits.to_device(&Device::Cpu)?.flatten_all()?.to_vec1::<f32>()?[0];
        Ok(1.0 / (1.0 + (-logit).exp()))
    }
}

impl Reranker for CrossEncoder {
    fn score_pairs(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        passages.iter().map(|p| self.score_one(query, p)).collect()
    }
}

/// Term-overlap scorer standing in for the cross-encoder in tests:
/// deterministic, order-free, no model files.
struct FakeReranker;

impl FakeReranker {
    fn score_one(query: &str, passage: &str) -> f32 {
        let passage = passage.to_lowercase();
        let terms: Vec<String> = query
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 2)
            .map(|t| t.to_string())
            .collect();
        if terms.is_empty() {
            return 0.0;
        }
        let hits = terms.iter().filter(|t| passage.contains(t.as_str())).count();
        hits as f32 / terms.len() as f32
    }
}

impl Reranker for FakeReranker {
    fn score_pairs(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        Ok(passages.iter().map(|p| Self::score_one(query, p)).collect())
    }
}

/// Load the cross-encoder for the configured model id. Errors here are the
/// caller's signal to degrade to un-reranked fusion output.
pub fn load_reranker(model_id: &str, models_dir: &Path) -> Result<Box<dyn Reranker>> {
    if env_flag("APP_USE_FAKE_RERANKER") {
        info!("using fake reranker (APP_USE_FAKE_RERANKER)");
        return Ok(Box::new(FakeReranker));
    }
    let model = CrossEncoder::load(&model_dir_for(model_id, models_dir))?;
    Ok(Box::new(model))
}
