//! In-memory `VectorIndex` and `ChunkStore` with exhaustive dot-product search.
//!
//! Used by tests and small demos; rankings break ties by chunk key and then
//! token number so results are deterministic.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use colsearch_core::error::{Result, RetrievalError};
use colsearch_core::traits::{ChunkStore, VectorIndex};
use colsearch_core::types::{AnnHit, ChunkKey, SearchSpace, Vector};

use crate::scorer::dot;

struct DenseEntry {
    key: ChunkKey,
    vector: Vector,
    body: String,
}

struct TokenEntry {
    key: ChunkKey,
    token_no: i32,
    vector: Vector,
}

#[derive(Default)]
pub struct InMemoryIndex {
    dense: Vec<DenseEntry>,
    tokens: Vec<TokenEntry>,
    unavailable: HashSet<SearchSpace>,
    fail_token_search_at: Option<usize>,
    token_searches: AtomicUsize,
}

impl InMemoryIndex {
    pub fn new() -> Self { Self::default() }

    pub fn add_chunk(mut self, key: ChunkKey, vector: Vector, body: impl Into<String>) -> Self {
        self.dense.push(DenseEntry { key, vector, body: body.into() });
        self
    }

    pub fn add_token(mut self, key: ChunkKey, token_no: i32, vector: Vector) -> Self {
        self.tokens.push(TokenEntry { key, token_no, vector });
        self
    }

    /// Report `IndexUnavailable` for every search in `space`.
    pub fn mark_unavailable(mut self, space: SearchSpace) -> Self {
        self.unavailable.insert(space);
        self
    }

    /// Fail the `nth` token-space search (zero based) with a backend error.
    pub fn fail_token_search_at(mut self, nth: usize) -> Self {
        self.fail_token_search_at = Some(nth);
        self
    }

    /// Number of token-space searches served so far.
    pub fn token_search_count(&self) -> usize { self.token_searches.load(Ordering::SeqCst) }
}

fn ranked<'a, T>(
    entries: &'a [T],
    query: &[f32],
    limit: usize,
    vector: impl Fn(&T) -> &[f32],
    order: impl Fn(&T) -> (&ChunkKey, i32),
) -> Vec<&'a T> {
    let mut scored: Vec<(f32, &T)> = entries.iter().map(|e| (dot(query, vector(e)), e)).collect();
    scored.sort_by(|(sa, a), (sb, b)| sb.total_cmp(sa).then_with(|| order(a).cmp(&order(b))));
    scored.into_iter().take(limit).map(|(_, e)| e).collect()
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn ann_search(&self, space: SearchSpace, vector: &[f32], limit: usize) -> Result<Vec<AnnHit>> {
        if self.unavailable.contains(&space) {
            return Err(RetrievalError::IndexUnavailable { space, reason: "marked unavailable".into() });
        }
        match space {
            SearchSpace::Dense => Ok(ranked(&self.dense, vector, limit, |e| &e.vector, |e| (&e.key, 0))
                .into_iter()
                .map(|e| AnnHit::dense(e.key.clone(), e.body.clone()))
                .collect()),
            SearchSpace::Token => {
                let nth = self.token_searches.fetch_add(1, Ordering::SeqCst);
                if self.fail_token_search_at == Some(nth) {
                    return Err(RetrievalError::backend(space, format!("injected failure on search {nth}")));
                }
                Ok(ranked(&self.tokens, vector, limit, |e| &e.vector, |e| (&e.key, e.token_no))
                    .into_iter()
                    .map(|e| AnnHit::token(e.key.clone(), Some(e.token_no), e.vector.clone()))
                    .collect())
            }
        }
    }
}

/// Bodies keyed by chunk, counting every lookup.
#[derive(Default)]
pub struct InMemoryChunkStore {
    bodies: HashMap<ChunkKey, String>,
    fetches: AtomicUsize,
}

impl InMemoryChunkStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_body(mut self, key: ChunkKey, body: impl Into<String>) -> Self {
        self.bodies.insert(key, body.into());
        self
    }

    pub fn fetch_count(&self) -> usize { self.fetches.load(Ordering::SeqCst) }
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn fetch_body(&self, key: &ChunkKey) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.bodies.get(key).cloned().ok_or_else(|| RetrievalError::NotFound(key.clone()))
    }
}
