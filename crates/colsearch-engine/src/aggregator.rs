//! Fan-out of per-query-token ANN searches and per-chunk evidence collection.

use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;

use colsearch_core::error::{Result, RetrievalError};
use colsearch_core::traits::{ChunkStore, VectorIndex};
use colsearch_core::types::{AnnHit, ChunkKey, SearchSpace, TokenEmbedding, Vector};

/// A body fetch started speculatively when a chunk is first discovered.
///
/// Dropping an unresolved fetch aborts it, so candidates that do not make the
/// top K release their in-flight lookups when they are discarded.
pub struct BodyFetch {
    handle: Option<JoinHandle<Result<String>>>,
}

impl BodyFetch {
    /// Start fetching `key`'s body on the runtime without waiting for it.
    pub fn spawn(store: Arc<dyn ChunkStore>, key: ChunkKey) -> Self {
        let handle = tokio::spawn(async move { store.fetch_body(&key).await });
        Self { handle: Some(handle) }
    }

    pub async fn resolve(mut self) -> Result<String> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| RetrievalError::Internal("body fetch already resolved".into()))?;
        handle
            .await
            .map_err(|e| RetrievalError::Internal(format!("body fetch task failed: {e}")))?
    }
}

impl Drop for BodyFetch {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Everything learned about one chunk during a single query.
pub struct CandidateEvidence {
    key: ChunkKey,
    embeddings: Vec<Vector>,
    seen_tokens: HashSet<i32>,
    body: BodyFetch,
}

impl CandidateEvidence {
    pub fn new(key: ChunkKey, body: BodyFetch) -> Self {
        Self { key, embeddings: Vec::new(), seen_tokens: HashSet::new(), body }
    }

    /// Add a document-token embedding; returns false when that token is
    /// already part of the evidence.
    pub fn add(&mut self, token_no: Option<i32>, vector: Vector) -> bool {
        if let Some(no) = token_no {
            if !self.seen_tokens.insert(no) {
                return false;
            }
        }
        self.embeddings.push(vector);
        true
    }

    pub fn key(&self) -> &ChunkKey { &self.key }

    pub fn embeddings(&self) -> &[Vector] { &self.embeddings }

    pub fn into_body(self) -> BodyFetch { self.body }
}

pub type Candidates = HashMap<ChunkKey, CandidateEvidence>;

/// Runs one token-space search per query token and groups the hits by chunk.
pub struct CandidateAggregator {
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn ChunkStore>,
    fanout: usize,
    concurrency: usize,
    token_dim: usize,
}

impl CandidateAggregator {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn ChunkStore>,
        fanout: usize,
        concurrency: usize,
        token_dim: usize,
    ) -> Self {
        Self { index, store, fanout, concurrency: concurrency.max(1), token_dim }
    }

    /// Collect evidence for every chunk any query token's search surfaces.
    ///
    /// Searches run concurrently, at most `concurrency` at a time; hits are
    /// merged here as each search returns, so a chunk's evidence is only ever
    /// touched by this task. A chunk's body fetch starts the first time the
    /// chunk is seen. Any failed search fails the whole aggregation, and the
    /// partially collected candidates (with their fetches) are dropped.
    pub async fn aggregate(&self, query_tokens: &[Vector]) -> Result<Candidates> {
        for q in query_tokens {
            if q.len() != self.token_dim {
                return Err(RetrievalError::DimensionMismatch {
                    space: SearchSpace::Token,
                    expected: self.token_dim,
                    actual: q.len(),
                });
            }
        }
        let total = query_tokens.len();
        let index = &self.index;
        let fanout = self.fanout;
        let mut searches = futures::stream::iter(query_tokens.iter().enumerate())
            .map(|(token, q)| async move { (token, index.ann_search(SearchSpace::Token, q, fanout).await) })
            .buffer_unordered(self.concurrency);

        let mut candidates = Candidates::new();
        while let Some((token, outcome)) = searches.next().await {
            let hits = match outcome {
                Ok(hits) => hits,
                Err(e @ RetrievalError::IndexUnavailable { .. }) => return Err(e),
                Err(e) => {
                    return Err(RetrievalError::PartialSearchFailure { token, total, source: Box::new(e) });
                }
            };
            tracing::debug!(token, hits = hits.len(), "token search returned");
            for hit in hits {
                self.merge(&mut candidates, hit)?;
            }
        }
        tracing::debug!(query_tokens = total, candidates = candidates.len(), "aggregation finished");
        Ok(candidates)
    }

    fn merge(&self, candidates: &mut Candidates, hit: AnnHit) -> Result<()> {
        let TokenEmbedding { key, token_no, vector } = hit.into_token_embedding().map_err(|key| {
            RetrievalError::backend(SearchSpace::Token, format!("token hit for {key} carries no embedding"))
        })?;
        if vector.len() != self.token_dim {
            return Err(RetrievalError::DimensionMismatch {
                space: SearchSpace::Token,
                expected: self.token_dim,
                actual: vector.len(),
            });
        }
        let evidence = candidates.entry(key).or_insert_with_key(|key| {
            CandidateEvidence::new(key.clone(), BodyFetch::spawn(Arc::clone(&self.store), key.clone()))
        });
        evidence.add(token_no, vector);
        Ok(())
    }
}
