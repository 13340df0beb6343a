use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AnnHit, ChunkKey, SearchSpace, Vector};

/// Encodes a whole text into one dense vector.
pub trait DenseEncoder: Send + Sync {
    fn dim(&self) -> usize;
    fn encode_dense(&self, text: &str) -> anyhow::Result<Vector>;
}

/// Encodes a query into one vector per query token.
pub trait TokenEncoder: Send + Sync {
    fn dim(&self) -> usize;
    fn encode_tokens(&self, text: &str) -> anyhow::Result<Vec<Vector>>;
}

/// Approximate nearest-neighbour search over stored vectors.
///
/// Results are ordered best first. An absent or unbuilt index must be
/// reported as `RetrievalError::IndexUnavailable`, never as an empty result.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn ann_search(&self, space: SearchSpace, vector: &[f32], limit: usize) -> Result<Vec<AnnHit>>;
}

/// Point lookup of chunk bodies.
///
/// Fails with `RetrievalError::NotFound` when the key has no body row.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn fetch_body(&self, key: &ChunkKey) -> Result<String>;
}
