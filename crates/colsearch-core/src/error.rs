use thiserror::Error;

use crate::types::{ChunkKey, SearchSpace};

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The ANN index for `space` is missing or unbuilt.
    #[error("{space} index unavailable: {reason}")]
    IndexUnavailable { space: SearchSpace, reason: String },

    /// One of the per-query-token searches failed; the evidence set is incomplete.
    #[error("token search {token} of {total} failed: {source}")]
    PartialSearchFailure {
        token: usize,
        total: usize,
        #[source]
        source: Box<RetrievalError>,
    },

    /// A selected candidate was indexed in token space but has no body row.
    #[error("no body stored for selected candidate {key}")]
    BodyFetchInconsistency { key: ChunkKey },

    /// The query encoder failed; `source` is its error, chain intact.
    #[error("{space} encoder failed: {source:#}")]
    Encoder {
        space: SearchSpace,
        #[source]
        source: anyhow::Error,
    },

    #[error("Not found: {0}")]
    NotFound(ChunkKey),

    #[error("{space} vector has dimension {actual}, expected {expected}")]
    DimensionMismatch { space: SearchSpace, expected: usize, actual: usize },

    #[error("{space} store error: {message}")]
    Backend { space: SearchSpace, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RetrievalError {
    /// The retrieval mode this failure belongs to, when it belongs to one.
    ///
    /// Body fetches and per-token searches only happen on the late-interaction
    /// path, so they report `SearchSpace::Token`.
    pub fn space(&self) -> Option<SearchSpace> {
        match self {
            Self::IndexUnavailable { space, .. }
            | Self::Encoder { space, .. }
            | Self::DimensionMismatch { space, .. }
            | Self::Backend { space, .. } => Some(*space),
            Self::PartialSearchFailure { .. } | Self::BodyFetchInconsistency { .. } => Some(SearchSpace::Token),
            Self::NotFound(_) | Self::InvalidConfig(_) | Self::Internal(_) => None,
        }
    }

    pub fn backend(space: SearchSpace, err: impl std::fmt::Display) -> Self {
        Self::Backend { space, message: err.to_string() }
    }

    pub fn encoder(space: SearchSpace, source: anyhow::Error) -> Self {
        Self::Encoder { space, source }
    }
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
