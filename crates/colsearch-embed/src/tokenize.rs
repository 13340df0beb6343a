use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Token ids and attention mask for `text`, truncated to `max_len`.
pub fn encode_truncated(tokenizer: &Tokenizer, text: &str, max_len: usize) -> Result<(Vec<u32>, Vec<u32>)> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    if ids.len() > max_len { ids.truncate(max_len); mask.truncate(max_len); }
    Ok((ids, mask))
}

pub fn token_id(tokenizer: &Tokenizer, token: &str) -> Result<u32> {
    tokenizer.token_to_id(token).ok_or_else(|| anyhow!("tokenizer has no '{}' token", token))
}

/// `(input_ids, attention_mask)` as `[1,T]` tensors on `device`.
pub fn to_device_tensors(ids: &[u32], mask: &[u32], device: &Device) -> Result<(Tensor, Tensor)> {
    let input_ids = Tensor::new(ids, device)?.unsqueeze(0)?;
    let attention_mask = Tensor::new(mask, device)?.unsqueeze(0)?;
    Ok((input_ids, attention_mask))
}
