//! colsearch-embed
//!
//! Query encoders: all-MiniLM-L6-v2 for the dense space, ColBERT v2 for the
//! token space, both on candle. Deterministic fakes stand in for the models
//! when `embedding.use_fake` or `APP_USE_FAKE_EMBEDDINGS=1` is set.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::Config as BertConfig;

use colsearch_core::config::{expand_path, EmbeddingSettings};
use colsearch_core::traits::{DenseEncoder, TokenEncoder};

pub mod colbert;
pub mod device;
pub mod fake;
pub mod minilm;
pub mod pool;
pub mod tokenize;

pub use colbert::{query_layout, ColbertQueryEncoder, SpecialIds};
pub use fake::{FakeDenseEncoder, FakeTokenEncoder};
pub use minilm::MiniLmEncoder;
pub use pool::{l2_normalize_rows, masked_mean_l2};

/// Both query encoders, built once and shared.
#[derive(Clone)]
pub struct Encoders {
    pub dense: Arc<dyn DenseEncoder>,
    pub tokens: Arc<dyn TokenEncoder>,
}

fn fake_requested(settings: &EmbeddingSettings) -> bool {
    settings.use_fake
        || std::env::var("APP_USE_FAKE_EMBEDDINGS")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
}

pub fn load_encoders(settings: &EmbeddingSettings) -> Result<Encoders> {
    if fake_requested(settings) {
        tracing::info!("using fake encoders");
        return Ok(Encoders {
            dense: Arc::new(FakeDenseEncoder::new(settings.dense_dim)),
            tokens: Arc::new(FakeTokenEncoder::new(settings.token_dim)),
        });
    }
    let dense = MiniLmEncoder::load(&expand_path(&settings.dense_model_dir))?;
    if dense.dim() != settings.dense_dim {
        return Err(anyhow!("dense model has {} dims, config says {}", dense.dim(), settings.dense_dim));
    }
    let tokens = ColbertQueryEncoder::load(
        &expand_path(&settings.colbert_model_dir),
        settings.token_dim,
        settings.query_maxlen,
    )?;
    Ok(Encoders { dense: Arc::new(dense), tokens: Arc::new(tokens) })
}

/// Parse `config.json`, returning the candle config and its hidden size.
pub(crate) fn read_bert_config(model_dir: &Path) -> Result<(BertConfig, usize)> {
    let config_path = model_dir.join("config.json");
    let raw = std::fs::read_to_string(&config_path)
        .map_err(|e| anyhow!("Failed to read {}: {}", config_path.display(), e))?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let hidden = value
        .get("hidden_size")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;
    Ok((serde_json::from_value(value)?, hidden))
}

/// Weights from `model.safetensors` when present, else `pytorch_model.bin`.
pub(crate) fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        // SAFETY: the file is memory-mapped read-only and not modified while loaded.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? };
        return Ok(vb);
    }
    let weights_path = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&weights_path)
        .map_err(|e| anyhow!("Failed to load weights from {}: {}", weights_path.display(), e))?;
    let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}
