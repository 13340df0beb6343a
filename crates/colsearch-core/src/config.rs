//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_RETRIEVAL__TOP_K=10`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::RetrievalError;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(Path::new("."), &env_name)
    }

    /// Load `config.toml` and the env-specific overlay from `dir`, then `APP_*` vars.
    pub fn load_for_env(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The typed settings tree; absent keys take their defaults.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract::<Settings>()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), RetrievalError> {
        self.retrieval.validate()?;
        self.embedding.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub lancedb_dir: String,
    pub chunks_table: String,
    pub tokens_table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            lancedb_dir: "data/lancedb".to_string(),
            chunks_table: "chunks".to_string(),
            tokens_table: "chunk_tokens".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of results returned when the caller does not pass `k`.
    pub top_k: usize,
    /// ANN limit for each per-query-token search.
    pub token_fanout: usize,
    /// Maximum number of per-token searches in flight for one query.
    pub search_concurrency: usize,
    /// Treat a table without an ANN index on its vector column as unavailable.
    pub require_ann_index: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 5, token_fanout: 5, search_concurrency: 8, require_ann_index: false }
    }
}

impl RetrievalSettings {
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.top_k == 0 {
            return Err(RetrievalError::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if self.token_fanout == 0 {
            return Err(RetrievalError::InvalidConfig("retrieval.token_fanout must be at least 1".into()));
        }
        if self.search_concurrency == 0 {
            return Err(RetrievalError::InvalidConfig("retrieval.search_concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub dense_model_dir: String,
    pub colbert_model_dir: String,
    pub dense_dim: usize,
    pub token_dim: usize,
    pub query_maxlen: usize,
    pub use_fake: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            dense_model_dir: "models/all-MiniLM-L6-v2".to_string(),
            colbert_model_dir: "models/colbertv2.0".to_string(),
            dense_dim: 384,
            token_dim: 128,
            query_maxlen: 32,
            use_fake: false,
        }
    }
}

impl EmbeddingSettings {
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.dense_dim == 0 || self.token_dim == 0 {
            return Err(RetrievalError::InvalidConfig("embedding dimensions must be non-zero".into()));
        }
        if self.query_maxlen < 3 {
            return Err(RetrievalError::InvalidConfig(format!(
                "embedding.query_maxlen is {}, needs room for [CLS], [Q] and [SEP]",
                self.query_maxlen
            )));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
