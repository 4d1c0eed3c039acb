use std::path::Path;
use std::sync::Arc;

use docqa_core::error::Error;
use docqa_core::traits::{Embedder, Retriever};
use docqa_core::types::Chunk;
use docqa_embed::load_embedder;
use docqa_vector::{ChunkStore, PartitionWriter, SemanticRetriever};

fn chunk(id: &str, text: &str, page: u32) -> Chunk {
    Chunk { id: id.to_string(), text: text.to_string(), source: "asvs.pdf".to_string(), page }
}

fn fake_embedder() -> Arc<dyn Embedder> {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");
    load_embedder("unused", "unused", Path::new("models")).expect("fake embedder").into()
}

fn seed_partition(db_path: &Path, partition: &str, embedder: &dyn Embedder) -> Vec<Chunk> {
    let chunks = vec![
        chunk("c0", "Section 5.1 requires MFA for privileged accounts.", 10),
        chunk("c1", "Password length must be 12+ characters.", 5),
        chunk("c2", "Session tokens expire after 30 minutes of inactivity.", 7),
    ];
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).expect("embed");
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    runtime
        .block_on(async {
            let writer = PartitionWriter::create(db_path, partition, embedder.dim()).await?;
            writer.write(&chunks, &embeddings).await
        })
        .expect("write partition");
    chunks
}

#[test]
fn write_then_load_roundtrip() {
    let tmp = tempfile::TempDir::new().expect("tempdir");
    let embedder = fake_embedder();
    let seeded = seed_partition(tmp.path(), "asvs_fixed", embedder.as_ref());

    let store = ChunkStore::open(tmp.path()).expect("open store");
    assert!(store.has_partition("asvs_fixed").expect("has"));

    let loaded = store.load_partition("asvs_fixed").expect("load");
    assert_eq!(loaded.len(), seeded.len());
    let ids: Vec<&str> = loaded.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c0", "c1", "c2"], "insertion order preserved");
    assert_eq!(loaded[0].page, 10);
    assert_eq!(loaded[0].source, "asvs.pdf");
}

#[test]
fn missing_partition_is_not_found() {
    let tmp = tempfile::TempDir::new().expect("tempdir");
    let store = ChunkStore::open(tmp.path()).expect("open store");
    let err = store.load_partition("never_ingested").expect_err("must fail");
    let core_err = err.downcast_ref::<Error>().expect("typed error");
    assert!(matches!(core_err, Error::NotFound(_)));
}

#[test]
fn semantic_retrieve_is_bounded_and_deterministic() {
    let tmp = tempfile::TempDir::new().expect("tempdir");
    let embedder = fake_embedder();
    seed_partition(tmp.path(), "asvs_sem", embedder.as_ref());

    let store = Arc::new(ChunkStore::open(tmp.path()).expect("open store"));
    let retriever = SemanticRetriever::new(store, "asvs_sem".to_string(), embedder);

    let hits = retriever.retrieve("privileged accounts MFA", 2).expect("retrieve");
    assert!(hits.len() <= 2);
    assert!(!hits.is_empty());

    let a: Vec<String> =
        retriever.retrieve("password length", 3).expect("a").iter().map(|h| h.chunk.id.clone()).collect();
    let b: Vec<String> =
        retriever.retrieve("password length", 3).expect("b").iter().map(|h| h.chunk.id.clone()).collect();
    assert_eq!(a, b, "fixed index + fixed model give a fixed order");
}
