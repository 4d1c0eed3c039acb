use std::fs;

use docqa_core::config::{expand_path, Config};
use docqa_embed::load_embedder;
use docqa_ingest::{chunk_pages, load_parsed_pages};
use docqa_vector::{ChunkStore, PartitionWriter};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;

    let parsed_path = expand_path(
        config
            .get::<String>("data.parsed_pages")
            .unwrap_or_else(|_| "data/parsed_pages.json".to_string()),
    );
    if !parsed_path.exists() {
        eprintln!("'{}' not found. Run docqa-parse first.", parsed_path.display());
        std::process::exit(1);
    }
    let pages = load_parsed_pages(&parsed_path)?;
    println!("Loaded {} page records from {}", pages.len(), parsed_path.display());

    let db_path = expand_path(config.get::<String>("data.lancedb_dir")?);
    let models_dir = expand_path(
        config.get::<String>("data.models_dir").unwrap_or_else(|_| "models".to_string()),
    );
    let models = config.retriever_models()?;
    fs::create_dir_all(&db_path)?;
    let store = ChunkStore::open(&db_path)?;

    let runtime = tokio::runtime::Runtime::new()?;
    for strategy in config.strategies()? {
        println!("\n==================== strategy {} ====================", strategy.id);
        if store.has_partition(&strategy.partition)? {
            println!("Partition '{}' already exists. Skipping.", strategy.partition);
            continue;
        }
        let embedder = load_embedder(
            &strategy.embedding_model,
            &models.default_embedding_fallback,
            &models_dir,
        )?;
        let chunks = chunk_pages(&pages, &strategy, Some(embedder.as_ref()))?;
        println!("Generated {} chunks", chunks.len());
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts)?;
        runtime.block_on(async {
            let writer =
                PartitionWriter::create(&db_path, &strategy.partition, embedder.dim()).await?;
            writer.write(&chunks, &embeddings).await
        })?;
    }

    println!("\n✅ Ingestion completed");
    println!("💡 To query, use: cargo run --bin docqa-search '<query>'");
    Ok(())
}
