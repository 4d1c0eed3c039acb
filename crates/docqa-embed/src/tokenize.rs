use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

fn to_padded_tensors(
    mut ids: Vec<u32>,
    mut mask: Vec<u32>,
    max_len: usize,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    if ids.len() > max_len {
        ids.truncate(max_len);
        mask.truncate(max_len);
    }
    if ids.len() < max_len {
        let pad = max_len - ids.len();
        ids.extend(std::iter::repeat(1).take(pad));
        mask.extend(std::iter::repeat(0).take(pad));
    }
    let input_ids = Tensor::from_iter(ids, device)?.reshape((1, max_len))?;
    let attention_mask = Tensor::from_iter(mask, device)?.reshape((1, max_len))?;
    Ok((input_ids, attention_mask))
}

/// Tokenize a single text into padded `(input_ids, attention_mask)` tensors.
pub fn tokenize_on_device(
    tokenizer: &Tokenizer,
    text: &str,
    max_len: usize,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer
        .encode(text, true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    to_padded_tensors(enc.get_ids().to_vec(), enc.get_attention_mask().to_vec(), max_len, device)
}

/// Tokenize a (query, passage) pair for cross-encoder scoring. The two
/// sequences share one input with the tokenizer's separator between them.
pub fn tokenize_pair_on_device(
    tokenizer: &Tokenizer,
    query: &str,
    passage: &str,
    max_len: usize,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer
        .encode((query.to_string(), passage.to_string()), true)
        .map_err(|e| anyhow!("Pair tokenization failed: {}", e))?;
    to_padded_tensors(enc.get_ids().to_vec(), enc.get_attention_mask().to_vec(), max_len, device)
}
