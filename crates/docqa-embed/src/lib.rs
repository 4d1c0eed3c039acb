//! Embedding and re-ranking models for the retrieval pipeline.
//!
//! Both models load from a local directory holding `tokenizer.json`,
//! `config.json` and either `model.safetensors` or `pytorch_model.bin`.
//! Deterministic fakes are selected with `APP_USE_FAKE_EMBEDDINGS` /
//! `APP_USE_FAKE_RERANKER` so tests and offline runs never touch model
//! weights.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{info, warn};

use docqa_core::config::expand_path;
use docqa_core::traits::Embedder;

pub mod device;
pub mod pooling;
pub mod rerank;
pub mod tokenize;

pub use device::select_device;
pub use pooling::masked_mean_normalized;
pub use rerank::{load_reranker, CrossEncoder};

const DEFAULT_MAX_LEN: usize = 256;
const FAKE_EMBEDDING_DIM: usize = 384;

pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Map a model identifier to a directory: path-looking ids are used as-is
/// (after `~`/`$VAR` expansion), bare names resolve under `models_dir`.
pub fn model_dir_for(id: &str, models_dir: &Path) -> PathBuf {
    if id.contains('/') || id.contains(std::path::MAIN_SEPARATOR) {
        expand_path(id)
    } else {
        models_dir.join(id)
    }
}

/// Resolution step 1 of the embedding fallback policy: a configured id that
/// looks like a filesystem path but points nowhere is replaced by the
/// fallback id before any load is attempted.
pub fn resolve_embedding_id(primary: &str, fallback: &str, models_dir: &Path) -> String {
    let looks_like_path = primary.contains('/') || primary.contains(std::path::MAIN_SEPARATOR);
    if looks_like_path && !model_dir_for(primary, models_dir).exists() {
        warn!(
            "embedding model path '{}' does not exist, substituting fallback '{}'",
            primary, fallback
        );
        fallback.to_string()
    } else {
        primary.to_string()
    }
}

pub(crate) fn load_varbuilder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? });
    }
    let weights_path = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&weights_path)?;
    let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}

pub(crate) fn load_tokenizer_and_config(model_dir: &Path) -> Result<(Tokenizer, XLMRobertaConfig)> {
    let tokenizer_path = model_dir.join("tokenizer.json");
    let tokenizer = Tokenizer::from_file(&tokenizer_path)
        .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
    let config_path = model_dir.join("config.json");
    let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
    Ok((tokenizer, config))
}

/// XLM-RoBERTa sentence embedder: masked-mean pooled, L2-normalized.
pub struct EmbeddingModel {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

impl EmbeddingModel {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!("loading embedding model from {}", model_dir.display());
        let (tokenizer, config) = load_tokenizer_and_config(model_dir)?;
        let vb = load_varbuilder(model_dir, &device)?;
        let dim = config.hidden_size;
        let model = XLMRobertaModel::new(&config, vb)?;
        Ok(Self { model, tokenizer, device, dim, max_len: DEFAULT_MAX_LEN })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let (input_ids, attention_mask) =
            tokenize::tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = Tensor::zeros((1, self.max_len), DType::I64, &self.device)?;
        let hidden =
            self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_normalized(&hidden, &attention_mask)?;
        let vector = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?;
        Ok(vector)
    }
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        self.max_len
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }
}

/// Hash-bucket embedder for tests and offline runs: deterministic,
/// L2-normalized, no model files required.
struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        let lowered = text.to_lowercase();
        for (i, token) in lowered.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        DEFAULT_MAX_LEN
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Load the embedder for a strategy, applying the full fallback policy:
/// path-miss substitution first, then load-failure substitution. Only a
/// failing fallback load propagates an error.
pub fn load_embedder(primary: &str, fallback: &str, models_dir: &Path) -> Result<Box<dyn Embedder>> {
    if env_flag("APP_USE_FAKE_EMBEDDINGS") {
        info!("using fake embedder (APP_USE_FAKE_EMBEDDINGS)");
        return Ok(Box::new(FakeEmbedder::new(FAKE_EMBEDDING_DIM)));
    }
    let resolved = resolve_embedding_id(primary, fallback, models_dir);
    match EmbeddingModel::load(&model_dir_for(&resolved, models_dir)) {
        Ok(model) => Ok(Box::new(model)),
        Err(err) if resolved != fallback => {
            warn!(
                "failed to load embedding model '{}': {}; falling back to '{}'",
                resolved, err, fallback
            );
            let model = EmbeddingModel::load(&model_dir_for(fallback, models_dir))?;
            Ok(Box::new(model))
        }
        Err(err) => Err(err),
    }
}
