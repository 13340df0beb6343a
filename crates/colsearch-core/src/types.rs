//! Domain types shared by encoders, stores and the retrieval engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A query or stored embedding.
pub type Vector = Vec<f32>;

/// Identity of a retrievable passage.
///
/// - `title`: title of the source article
/// - `chunk_no`: position of the chunk within the article
///
/// Ordering is lexicographic on `(title, chunk_no)`, which is the
/// deterministic tie-break for equal scores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkKey {
    pub title: String,
    pub chunk_no: i32,
}

impl ChunkKey {
    pub fn new(title: impl Into<String>, chunk_no: i32) -> Self {
        Self { title: title.into(), chunk_no }
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [chunk {}]", self.title, self.chunk_no)
    }
}

/// The two embedding spaces a `VectorIndex` can be searched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchSpace {
    /// One whole-chunk embedding per chunk.
    Dense,
    /// One embedding per document token.
    Token,
}

impl fmt::Display for SearchSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchSpace::Dense => f.write_str("dense"),
            SearchSpace::Token => f.write_str("token"),
        }
    }
}

/// One document-token embedding, tagged with the chunk that owns it.
///
/// `token_no` is the token's position inside the chunk when the index knows
/// it; two hits with the same key and `token_no` are the same embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenEmbedding {
    pub key: ChunkKey,
    pub token_no: Option<i32>,
    pub vector: Vector,
}

/// A single ANN result row.
///
/// Dense-space hits carry `body`; token-space hits carry `embedding`
/// (and usually `token_no`).
#[derive(Debug, Clone, PartialEq)]
pub struct AnnHit {
    pub key: ChunkKey,
    pub token_no: Option<i32>,
    pub embedding: Option<Vector>,
    pub body: Option<String>,
}

impl AnnHit {
    pub fn dense(key: ChunkKey, body: impl Into<String>) -> Self {
        Self { key, token_no: None, embedding: None, body: Some(body.into()) }
    }

    pub fn token(key: ChunkKey, token_no: Option<i32>, embedding: Vector) -> Self {
        Self { key, token_no, embedding: Some(embedding), body: None }
    }

    /// The document-token embedding this hit carries; the key back when it has none.
    pub fn into_token_embedding(self) -> Result<TokenEmbedding, ChunkKey> {
        match self.embedding {
            Some(vector) => Ok(TokenEmbedding { key: self.key, token_no: self.token_no, vector }),
            None => Err(self.key),
        }
    }
}

/// What the caller-facing API returns, ordered best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub title: String,
    pub chunk_no: i32,
    pub body: String,
}

impl ResultRecord {
    pub fn new(key: ChunkKey, body: String) -> Self {
        Self { title: key.title, chunk_no: key.chunk_no, body }
    }

    pub fn key(&self) -> ChunkKey {
        ChunkKey::new(self.title.clone(), self.chunk_no)
    }
}

/// Renders results as numbered `title [chunk n]` blocks separated by a blank line.
pub fn format_results(results: &[ResultRecord]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {} [chunk {}]\n{}", i + 1, r.title, r.chunk_no, r.body))
        .collect::<Vec<_>>()
        .join("\n\n")
}
