use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use docqa_core::config::{expand_path, Config, FusionConfig, RetrieverModels, StrategyConfig};
use docqa_core::traits::{Embedder, Retriever};
use docqa_embed::{load_embedder, load_reranker};
use docqa_text::LexicalRetriever;
use docqa_vector::{ChunkStore, SemanticRetriever};

use crate::fusion::FusionRetriever;
use crate::rerank::RerankingRetriever;

/// Builds the retrieval pipeline for one strategy, bottom-up:
/// chunk store → lexical/semantic retrievers → fusion → re-ranker.
///
/// Each phase applies its own failure policy. Fatal: missing partition,
/// zero chunks, embedding fallback exhausted. Recoverable (logged, then
/// degraded): primary embedding model substitution, re-ranker load
/// failure. A degraded pipeline is still returned successfully.
pub struct RetrieverFactory {
    db_path: PathBuf,
    models_dir: PathBuf,
    models: RetrieverModels,
    fusion: FusionConfig,
}

impl RetrieverFactory {
    pub fn new(
        db_path: PathBuf,
        models_dir: PathBuf,
        models: RetrieverModels,
        fusion: FusionConfig,
    ) -> Self {
        Self { db_path, models_dir, models, fusion }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let db_path = expand_path(config.get::<String>("data.lancedb_dir")?);
        let models_dir =
            expand_path(config.get::<String>("data.models_dir").unwrap_or_else(|_| "models".to_string()));
        Ok(Self::new(db_path, models_dir, config.retriever_models()?, config.fusion()))
    }

    pub fn build(&self, strategy: &StrategyConfig) -> Result<Box<dyn Retriever>> {
        info!(
            "building retriever for strategy '{}' (partition '{}')",
            strategy.id, strategy.partition
        );

        // Phase 1: embedding model; the fallback ladder lives inside
        // load_embedder, only an exhausted fallback propagates.
        let embedder: Arc<dyn Embedder> = load_embedder(
            &strategy.embedding_model,
            &self.models.default_embedding_fallback,
            &self.models_dir,
        )?
        .into();

        // Phase 2: chunk store; a missing partition means ingestion never
        // ran for this strategy and no valid pipeline can exist.
        let store = Arc::new(ChunkStore::open(&self.db_path)?);
        let chunks = store.load_partition(&strategy.partition)?;

        // Phase 3: lexical index over the whole partition; zero chunks is
        // a configuration error inside the constructor.
        let lexical = LexicalRetriever::new(chunks)?;
        info!("lexical index ready ({} chunks)", lexical.len());

        // Phase 4
        let semantic = SemanticRetriever::new(
            Arc::clone(&store),
            strategy.partition.clone(),
            Arc::clone(&embedder),
        );

        // Phase 5
        let fusion = FusionRetriever::new(
            vec![
                (Box::new(lexical) as Box<dyn Retriever>, self.fusion.lexical_weight),
                (Box::new(semantic) as Box<dyn Retriever>, self.fusion.semantic_weight),
            ],
            self.fusion.fetch_k,
            self.fusion.rrf_k,
        )?;

        match load_reranker(&self.models.reranker_model, &self.models_dir) {
            Ok(model) => {
                info!("re-ranker ready: '{}'", self.models.reranker_model);
                Ok(Box::new(RerankingRetriever::new(Box::new(fusion), model, self.fusion.fetch_k)))
            }
            Err(err) => {
                warn!(
                    "re-ranker '{}' unavailable ({err:#}); serving fused results without re-ranking",
                    self.models.reranker_model
                );
                Ok(Box::new(fusion))
            }
        }
    }
}
