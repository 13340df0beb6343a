//! colsearch-core
//!
//! Shared vocabulary for the retrieval workspace: chunk identities, hits and
//! result records, the error taxonomy, the collaborator traits implemented by
//! encoders and stores, and the layered configuration loader.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Result, RetrievalError};
pub use types::{format_results, AnnHit, ChunkKey, ResultRecord, SearchSpace, TokenEmbedding};
