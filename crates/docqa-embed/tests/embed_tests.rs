use std::path::Path;

use docqa_core::traits::Embedder;
use docqa_embed::{load_embedder, resolve_embedding_id};

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid loading large model
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let embedder = load_embedder("models/bge-m3", "minilm-l6", Path::new("models")).expect("embedder");
    let texts = vec!["multifactor authentication".to_string(), "multifactor authentication".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), embedder.dim());

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn fake_embedder_separates_unrelated_texts() {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");
    let embedder = load_embedder("x", "y", Path::new("models")).expect("embedder");

    let cos = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let embs = embedder
        .embed_batch(&[
            "password length must be twelve characters".to_string(),
            "password length must be twelve characters or more".to_string(),
            "zebra giraffe crocodile".to_string(),
        ])
        .expect("embed_batch");

    let near = cos(&embs[0], &embs[1]);
    let far = cos(&embs[0], &embs[2]);
    assert!(near > far, "shared-term texts are closer (near={near}, far={far})");
}

#[test]
fn missing_path_id_resolves_to_fallback() {
    let models = Path::new("/definitely/not/here");
    // Path-looking id that does not exist -> fallback substituted up front
    let resolved = resolve_embedding_id("/no/such/model-dir", "minilm-l6", models);
    assert_eq!(resolved, "minilm-l6");

    // Bare names are not path-checked; they resolve under models_dir later
    let resolved = resolve_embedding_id("bge-m3", "minilm-l6", models);
    assert_eq!(resolved, "bge-m3");
}

#[test]
fn existing_path_id_is_kept() {
    let tmp = tempfile::TempDir::new().expect("tempdir");
    let dir = tmp.path().join("my-model");
    std::fs::create_dir_all(&dir).expect("mkdir");
    let id = dir.to_string_lossy().to_string();
    let resolved = resolve_embedding_id(&id, "minilm-l6", tmp.path());
    assert_eq!(resolved, id);
}
