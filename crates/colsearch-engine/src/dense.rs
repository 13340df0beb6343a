use std::sync::Arc;

use colsearch_core::error::{Result, RetrievalError};
use colsearch_core::traits::VectorIndex;
use colsearch_core::types::{ResultRecord, SearchSpace};

/// Single-vector baseline: one dense-space search, results in index order.
pub struct DenseRetriever {
    index: Arc<dyn VectorIndex>,
    dim: usize,
}

impl DenseRetriever {
    pub fn new(index: Arc<dyn VectorIndex>, dim: usize) -> Self {
        Self { index, dim }
    }

    pub async fn retrieve(&self, query_vector: &[f32], k: usize) -> Result<Vec<ResultRecord>> {
        if query_vector.len() != self.dim {
            return Err(RetrievalError::DimensionMismatch {
                space: SearchSpace::Dense,
                expected: self.dim,
                actual: query_vector.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let hits = self.index.ann_search(SearchSpace::Dense, query_vector, k).await?;
        hits.into_iter()
            .take(k)
            .map(|hit| {
                let body = hit.body.ok_or_else(|| {
                    RetrievalError::backend(SearchSpace::Dense, format!("dense hit for {} carries no body", hit.key))
                })?;
                Ok(ResultRecord::new(hit.key, body))
            })
            .collect()
    }
}
