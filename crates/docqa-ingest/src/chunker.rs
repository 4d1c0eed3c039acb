use anyhow::Result;
use tracing::info;

use docqa_core::config::{ChunkMethod, StrategyConfig};
use docqa_core::error::Error;
use docqa_core::traits::Embedder;
use docqa_core::types::Chunk;

use crate::pages::PageRecord;

/// Split page records into chunks under the strategy's chunking method.
/// Semantic chunking needs the strategy's embedder; fixed chunking does
/// not touch any model.
pub fn chunk_pages(
    pages: &[PageRecord],
    strategy: &StrategyConfig,
    embedder: Option<&dyn Embedder>,
) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();
    for page in pages {
        let pieces = match strategy.chunk_method {
            ChunkMethod::Fixed => split_fixed(&page.text, strategy.chunk_size, strategy.chunk_overlap),
            ChunkMethod::Semantic => {
                let embedder = embedder.ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "strategy '{}' uses semantic chunking but no embedder was provided",
                        strategy.id
                    ))
                })?;
                split_semantic(&page.text, embedder)?
            }
        };
        for piece in pieces {
            let ordinal = chunks.len();
            chunks.push(Chunk {
                id: chunk_id(&page.source, page.page, ordinal, &piece),
                text: piece,
                source: page.source.clone(),
                page: page.page,
            });
        }
    }
    info!(
        "chunked {} pages into {} chunks ({:?})",
        pages.len(),
        chunks.len(),
        strategy.chunk_method
    );
    Ok(chunks)
}

/// Stable chunk identity: same corpus in, same ids out, across re-runs.
fn chunk_id(source: &str, page: u32, ordinal: usize, text: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(source.as_bytes());
    hasher.update(&page.to_le_bytes());
    hasher.update(&(ordinal as u64).to_le_bytes());
    hasher.update(text.as_bytes());
    let hex = hasher.finalize().to_hex();
    hex.as_str()[..16].to_string()
}

/// Character-budgeted word windows with overlap carried into the next
/// window. A single word longer than the budget becomes its own chunk.
fn split_fixed(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < words.len() {
        let mut end = start;
        let mut len = 0usize;
        while end < words.len() && len + words[end].len() + 1 <= chunk_size {
            len += words[end].len() + 1;
            end += 1;
        }
        if end == start {
            end = start + 1;
        }
        chunks.push(words[start..end].join(" "));
        if end >= words.len() {
            break;
        }
        // step back far enough to carry ~overlap chars into the next chunk
        let mut back = end;
        let mut carried = 0usize;
        while back > start + 1 && carried < overlap {
            back -= 1;
            carried += words[back].len() + 1;
        }
        start = back;
    }
    chunks
}

/// Sentence-level splitting at embedding-similarity dips: a breakpoint
/// opens where adjacent-sentence similarity falls more than one standard
/// deviation below the page mean.
fn split_semantic(text: &str, embedder: &dyn Embedder) -> Result<Vec<String>> {
    let sentences = split_sentences(text);
    if sentences.len() <= 1 {
        return Ok(sentences);
    }
    let embeddings = embedder.embed_batch(&sentences)?;
    // embeddings are L2-normalized, dot product is cosine similarity
    let sims: Vec<f32> = embeddings.windows(2).map(|w| dot(&w[0], &w[1])).collect();
    let mean = sims.iter().sum::<f32>() / sims.len() as f32;
    let variance = sims.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / sims.len() as f32;
    let threshold = mean - variance.sqrt();

    let mut chunks = Vec::new();
    let mut current: Vec<String> = vec![sentences[0].clone()];
    for (i, sentence) in sentences.iter().enumerate().skip(1) {
        if sims[i - 1] < threshold {
            chunks.push(current.join(" "));
            current = Vec::new();
        }
        current.push(sentence.clone());
    }
    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    Ok(chunks)
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_embed::load_embedder;
    use std::path::Path;

    fn fixed_strategy(chunk_size: usize, chunk_overlap: usize) -> StrategyConfig {
        StrategyConfig {
            id: "fixed".to_string(),
            embedding_model: "unused".to_string(),
            partition: "p".to_string(),
            chunk_method: ChunkMethod::Fixed,
            chunk_size,
            chunk_overlap,
        }
    }

    fn page(text: &str) -> PageRecord {
        PageRecord { text: text.to_string(), source: "asvs.pdf".to_string(), page: 3 }
    }

    #[test]
    fn fixed_chunks_respect_the_size_budget() {
        let words: Vec<String> = (0..200).map(|i| format!("word{i}")).collect();
        let pages = vec![page(&words.join(" "))];
        let chunks = chunk_pages(&pages, &fixed_strategy(120, 20), None).expect("chunk");
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.len() <= 120, "chunk of {} chars busts the budget", c.text.len());
            assert_eq!(c.source, "asvs.pdf");
            assert_eq!(c.page, 3);
        }
    }

    #[test]
    fn fixed_chunks_overlap_by_carried_words() {
        let words: Vec<String> = (0..60).map(|i| format!("w{i:02}")).collect();
        let pages = vec![page(&words.join(" "))];
        let chunks = chunk_pages(&pages, &fixed_strategy(100, 20), None).expect("chunk");
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail: Vec<&str> = pair[0].text.split_whitespace().rev().take(2).collect();
            let head: Vec<&str> = pair[1].text.split_whitespace().take(8).collect();
            assert!(
                tail.iter().any(|w| head.contains(w)),
                "consecutive chunks share no words: {:?} / {:?}",
                pair[0].text,
                pair[1].text
            );
        }
    }

    #[test]
    fn chunk_ids_are_stable_and_unique() {
        let pages = vec![page("alpha bravo charlie delta echo foxtrot golf hotel india juliet")];
        let strategy = fixed_strategy(30, 8);
        let first = chunk_pages(&pages, &strategy, None).expect("chunk");
        let second = chunk_pages(&pages, &strategy, None).expect("chunk");
        let ids_a: Vec<&str> = first.iter().map(|c| c.id.as_str()).collect();
        let ids_b: Vec<&str> = second.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids_a, ids_b, "same corpus gives same ids");
        let mut dedup = ids_a.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), ids_a.len(), "ids are unique");
    }

    #[test]
    fn semantic_chunking_requires_an_embedder() {
        let mut strategy = fixed_strategy(1000, 200);
        strategy.chunk_method = ChunkMethod::Semantic;
        let err = chunk_pages(&[page("one sentence.")], &strategy, None).expect_err("no embedder");
        assert!(err.to_string().contains("semantic chunking"));
    }

    #[test]
    fn semantic_chunking_splits_on_topic_shift() {
        std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");
        let embedder = load_embedder("unused", "unused", Path::new("models")).expect("fake embedder");
        let mut strategy = fixed_strategy(1000, 200);
        strategy.chunk_method = ChunkMethod::Semantic;
        // Three near-identical password sentences, then an unrelated one:
        // the dip in adjacent similarity lands before the last sentence.
        let text = "Passwords must be long. Passwords must be long enough. \
                    Passwords must be long and random. Zebras graze on open grassland.";
        let chunks =
            chunk_pages(&[page(text)], &strategy, Some(embedder.as_ref())).expect("chunk");
        assert!(chunks.len() >= 2, "expected a breakpoint, got {:?}", chunks);
        assert!(chunks.last().expect("last").text.contains("Zebras"));
    }

    #[test]
    fn sentences_split_on_terminators() {
        let s = split_sentences("One. Two? Three! Four without end");
        assert_eq!(s.len(), 4);
        assert_eq!(s[3], "Four without end");
    }
}
