//! End-to-end ASVS scenario with the full pipeline: fused retrieval plus
//! cross-encoder re-ranking (deterministic fakes for both models).

use std::path::Path;

use docqa_core::config::{FusionConfig, RetrieverModels, StrategyConfig};
use docqa_core::types::Chunk;
use docqa_embed::load_embedder;
use docqa_hybrid::{retrieve_passages, RetrieverFactory};
use docqa_vector::PartitionWriter;

#[test]
fn reranked_pipeline_places_the_mfa_chunk_first() {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");
    std::env::set_var("APP_USE_FAKE_RERANKER", "1");

    let tmp = tempfile::TempDir::new().expect("tempdir");
    let embedder = load_embedder("unused", "unused", Path::new("models")).expect("fake embedder");
    let chunks = vec![
        Chunk {
            id: "c0".to_string(),
            text: "Section 5.1 requires MFA for privileged accounts.".to_string(),
            source: "asvs.pdf".to_string(),
            page: 10,
        },
        Chunk {
            id: "c1".to_string(),
            text: "Password length must be 12+ characters.".to_string(),
            source: "asvs.pdf".to_string(),
            page: 5,
        },
    ];
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).expect("embed");
    tokio::runtime::Runtime::new()
        .expect("runtime")
        .block_on(async {
            let writer = PartitionWriter::create(tmp.path(), "asvs_fixed", embedder.dim()).await?;
            writer.write(&chunks, &embeddings).await
        })
        .expect("seed partition");

    let factory = RetrieverFactory::new(
        tmp.path().to_path_buf(),
        tmp.path().join("models"),
        RetrieverModels {
            reranker_model: "fake".to_string(),
            default_embedding_fallback: "fallback".to_string(),
        },
        FusionConfig::default(),
    );
    let strategy = StrategyConfig {
        id: "fixed_1000".to_string(),
        embedding_model: "unused".to_string(),
        partition: "asvs_fixed".to_string(),
        chunk_method: Default::default(),
        chunk_size: 1000,
        chunk_overlap: 200,
    };
    let retriever = factory.build(&strategy).expect("build");

    let passages = retrieve_passages(
        retriever.as_ref(),
        "What does ASVS require for privileged account authentication?",
        3,
    )
    .expect("retrieve");

    assert!(!passages.is_empty());
    assert!(passages.len() <= 3);
    assert!(passages[0].text.contains("MFA"), "re-ranked rank 1 is the MFA requirement");
    assert_eq!(passages[0].page, 10);
}
