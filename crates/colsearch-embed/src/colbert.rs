//! ColBERT v2 query encoder.
//!
//! Query layout is `[CLS] [Q] tokens... [SEP]`, padded with `[MASK]` up to
//! `query_maxlen` (query augmentation). Padding positions are not attended to
//! but still produce output vectors, and every position is emitted.

use anyhow::{anyhow, ensure, Result};
use std::path::Path;

use candle_core::{Device, Module};
use candle_nn::{linear_no_bias, Linear};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use colsearch_core::traits::TokenEncoder;
use colsearch_core::types::Vector;

use crate::device::select_device;
use crate::pool::l2_normalize_rows;
use crate::tokenize::{to_device_tensors, token_id};
use crate::{load_var_builder, read_bert_config};

/// `[unused0]` is the query marker in the ColBERT vocabulary.
const QUERY_MARKER: &str = "[unused0]";

/// Vocabulary ids of the tokens that frame a ColBERT query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialIds {
    pub cls: u32,
    pub sep: u32,
    pub mask: u32,
    pub query: u32,
}

/// Ids and attention mask for one query, always `query_maxlen` long.
///
/// `[CLS] [Q] body... [SEP]` with the body cut to `query_maxlen - 3` ids, then
/// `[MASK]` padding with attention 0.
pub fn query_layout(body_ids: &[u32], special: &SpecialIds, query_maxlen: usize) -> (Vec<u32>, Vec<u32>) {
    let body = &body_ids[..body_ids.len().min(query_maxlen.saturating_sub(3))];
    let mut ids = Vec::with_capacity(query_maxlen);
    ids.push(special.cls);
    ids.push(special.query);
    ids.extend_from_slice(body);
    ids.push(special.sep);
    let mut mask = vec![1u32; ids.len()];
    if ids.len() < query_maxlen {
        ids.resize(query_maxlen, special.mask);
        mask.resize(query_maxlen, 0);
    }
    (ids, mask)
}

pub struct ColbertQueryEncoder {
    bert: BertModel,
    linear: Linear,
    tokenizer: Tokenizer,
    device: Device,
    special: SpecialIds,
    query_maxlen: usize,
    dim: usize,
}

impl ColbertQueryEncoder {
    pub fn load(model_dir: &Path, dim: usize, query_maxlen: usize) -> Result<Self> {
        ensure!(query_maxlen >= 3, "query_maxlen {} leaves no room for query tokens", query_maxlen);
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading ColBERT checkpoint");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let special = SpecialIds {
            cls: token_id(&tokenizer, "[CLS]")?,
            sep: token_id(&tokenizer, "[SEP]")?,
            mask: token_id(&tokenizer, "[MASK]")?,
            query: token_id(&tokenizer, QUERY_MARKER)?,
        };
        let (config, hidden): (BertConfig, usize) = read_bert_config(model_dir)?;
        let vb = load_var_builder(model_dir, &device)?;
        let bert = BertModel::load(vb.pp("bert"), &config)?;
        let linear = linear_no_bias(hidden, dim, vb.pp("linear"))?;
        tracing::info!(dim, query_maxlen, "token encoder ready");
        Ok(Self { bert, linear, tokenizer, device, special, query_maxlen, dim })
    }

    fn query_ids(&self, text: &str) -> Result<(Vec<u32>, Vec<u32>)> {
        let enc = self.tokenizer.encode(text, false).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        Ok(query_layout(enc.get_ids(), &self.special, self.query_maxlen))
    }

    fn encode(&self, text: &str) -> Result<Vec<Vector>> {
        let (ids, mask) = self.query_ids(text)?;
        let (input_ids, attention_mask) = to_device_tensors(&ids, &mask, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.bert.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let projected = self.linear.forward(&hidden)?.squeeze(0)?;
        let normalized = l2_normalize_rows(&projected)?;
        let rows: Vec<Vec<f32>> = normalized.to_device(&Device::Cpu)?.to_vec2()?;
        tracing::debug!(tokens = rows.len(), "query tokens encoded");
        Ok(rows)
    }
}

impl TokenEncoder for ColbertQueryEncoder {
    fn dim(&self) -> usize { self.dim }
    fn encode_tokens(&self, text: &str) -> Result<Vec<Vector>> { self.encode(text) }
}
