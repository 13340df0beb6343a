use anyhow::{anyhow, Result};
use std::path::Path;
use std::time::Instant;

use candle_core::Device;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use colsearch_core::traits::DenseEncoder;
use colsearch_core::types::Vector;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::{encode_truncated, to_device_tensors};
use crate::{load_var_builder, read_bert_config};

const MAX_LEN: usize = 256;

/// all-MiniLM-L6-v2 sentence encoder: BERT, masked mean pooling, L2 norm.
pub struct MiniLmEncoder { model: BertModel, tokenizer: Tokenizer, device: Device, dim: usize }

impl MiniLmEncoder {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading all-MiniLM-L6-v2");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let (config, dim): (BertConfig, usize) = read_bert_config(model_dir)?;
        let vb = load_var_builder(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        tracing::info!(dim, "dense encoder ready");
        Ok(Self { model, tokenizer, device, dim })
    }

    fn embed(&self, text: &str) -> Result<Vector> {
        let start = Instant::now();
        let (ids, mask) = encode_truncated(&self.tokenizer, text, MAX_LEN)?;
        let (input_ids, attention_mask) = to_device_tensors(&ids, &mask, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let v: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        if v.len() != self.dim { return Err(anyhow!("dense embedding has {} dims, expected {}", v.len(), self.dim)); }
        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "dense query encoded");
        Ok(v)
    }
}

impl DenseEncoder for MiniLmEncoder {
    fn dim(&self) -> usize { self.dim }
    fn encode_dense(&self, text: &str) -> Result<Vector> { self.embed(text) }
}
