use std::path::Path;

use docqa_embed::load_reranker;

#[test]
fn fake_reranker_prefers_term_overlap() {
    std::env::set_var("APP_USE_FAKE_RERANKER", "1");
    let reranker = load_reranker("bge-reranker-base", Path::new("models")).expect("reranker");

    let query = "What does the standard require for privileged account authentication?";
    let passages = vec![
        "Section 5.1 requires MFA for privileged accounts.".to_string(),
        "Password length must be 12+ characters.".to_string(),
    ];
    let scores = reranker.score_pairs(query, &passages).expect("score");
    assert_eq!(scores.len(), 2);
    assert!(
        scores[0] > scores[1],
        "passage sharing query terms scores higher ({} vs {})",
        scores[0],
        scores[1]
    );

    // Deterministic on repeat
    let again = reranker.score_pairs(query, &passages).expect("score");
    assert_eq!(scores, again);
}

#[test]
fn missing_model_dir_is_a_load_error() {
    let err = docqa_embed::CrossEncoder::load(Path::new("/no/such/reranker"));
    assert!(err.is_err(), "loading from a missing directory must fail so the factory can degrade");
}
