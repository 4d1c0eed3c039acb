//! Configuration loader and typed retrieval-strategy sections.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env
//! vars. Strategy bundles are resolved once, up front, and threaded through
//! factory construction as values so several strategies can coexist in one
//! process (the evaluation harness compares them side by side).

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// How a strategy splits page records into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkMethod {
    Fixed,
    Semantic,
}

impl Default for ChunkMethod {
    fn default() -> Self {
        ChunkMethod::Fixed
    }
}

/// An immutable named bundle describing one ingestion + retrieval setup.
/// Exactly one strategy is active per constructed pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    pub id: String,
    pub embedding_model: String,
    pub partition: String,
    #[serde(default)]
    pub chunk_method: ChunkMethod,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

/// Model identifiers shared by every strategy.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieverModels {
    pub reranker_model: String,
    pub default_embedding_fallback: String,
}

/// Fusion tuning. The weights favour semantic similarity, but lexical
/// recall catches exact-term matches embeddings miss (section numbers,
/// acronyms); tune per corpus.
#[derive(Debug, Clone, Deserialize)]
pub struct FusionConfig {
    #[serde(default = "default_fetch_k")]
    pub fetch_k: usize,
    #[serde(default = "default_rrf_k")]
    pub rrf_k: usize,
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f32,
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,
}

fn default_fetch_k() -> usize {
    15
}

fn default_rrf_k() -> usize {
    60
}

fn default_lexical_weight() -> f32 {
    0.25
}

fn default_semantic_weight() -> f32 {
    0.75
}

impl Default for FusionConfig {
    fn default() -> Self {
        FusionConfig {
            fetch_k: default_fetch_k(),
            rrf_k: default_rrf_k(),
            lexical_weight: default_lexical_weight(),
            semantic_weight: default_semantic_weight(),
        }
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_"));

        Ok(Self { figment })
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn strategies(&self) -> anyhow::Result<Vec<StrategyConfig>> {
        self.get("ingestion_strategies")
    }

    /// Resolve one named strategy; a missing id is a configuration error,
    /// not a silent default.
    pub fn strategy(&self, id: &str) -> anyhow::Result<StrategyConfig> {
        self.strategies()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("strategy '{}' is not defined in config", id)).into())
    }

    pub fn retriever_models(&self) -> anyhow::Result<RetrieverModels> {
        self.get("retriever_models")
    }

    pub fn fusion(&self) -> FusionConfig {
        self.figment.extract_inner("fusion").unwrap_or_default()
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
