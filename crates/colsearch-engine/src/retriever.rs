use std::sync::Arc;
use std::time::{Duration, Instant};

use colsearch_core::config::RetrievalSettings;
use colsearch_core::error::{Result, RetrievalError};
use colsearch_core::traits::{ChunkStore, DenseEncoder, TokenEncoder, VectorIndex};
use colsearch_core::types::{ResultRecord, SearchSpace, Vector};

use crate::aggregator::CandidateAggregator;
use crate::dense::DenseRetriever;
use crate::materialize::materialize;
use crate::scorer::score_all;
use crate::topk::select;

/// Caller-facing retrieval API.
///
/// Built once per process from long-lived encoder and store handles and
/// shared between queries; each query creates its own evidence and drops it
/// when the results are returned.
pub struct Retriever {
    dense_encoder: Arc<dyn DenseEncoder>,
    token_encoder: Arc<dyn TokenEncoder>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn ChunkStore>,
    settings: RetrievalSettings,
}

/// The result of one retrieval mode and how long it took.
pub struct ModeOutcome {
    pub results: Result<Vec<ResultRecord>>,
    pub elapsed: Duration,
}

/// Both modes for one query; each may fail independently.
pub struct Comparison {
    pub late_interaction: ModeOutcome,
    pub dense: ModeOutcome,
}

impl Comparison {
    /// Failed modes with their errors.
    pub fn failures(&self) -> Vec<(SearchSpace, &RetrievalError)> {
        let mut out = Vec::new();
        if let Err(e) = &self.late_interaction.results { out.push((SearchSpace::Token, e)); }
        if let Err(e) = &self.dense.results { out.push((SearchSpace::Dense, e)); }
        out
    }
}

async fn timed<F>(fut: F) -> ModeOutcome
where
    F: std::future::Future<Output = Result<Vec<ResultRecord>>>,
{
    let start = Instant::now();
    let results = fut.await;
    ModeOutcome { results, elapsed: start.elapsed() }
}

impl Retriever {
    pub fn new(
        dense_encoder: Arc<dyn DenseEncoder>,
        token_encoder: Arc<dyn TokenEncoder>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn ChunkStore>,
        settings: RetrievalSettings,
    ) -> Self {
        Self { dense_encoder, token_encoder, index, store, settings }
    }

    pub fn settings(&self) -> &RetrievalSettings { &self.settings }

    fn k_or_default(&self, k: Option<usize>) -> usize { k.unwrap_or(self.settings.top_k) }

    pub async fn retrieve_dense(&self, query: &str, k: Option<usize>) -> Result<Vec<ResultRecord>> {
        let encoder = Arc::clone(&self.dense_encoder);
        let text = query.to_string();
        let vector = tokio::task::spawn_blocking(move || encoder.encode_dense(&text))
            .await
            .map_err(|e| RetrievalError::Internal(format!("dense encoder task failed: {e}")))?
            .map_err(|e| RetrievalError::encoder(SearchSpace::Dense, e))?;
        self.retrieve_dense_vector(&vector, k).await
    }

    pub async fn retrieve_dense_vector(&self, query_vector: &[f32], k: Option<usize>) -> Result<Vec<ResultRecord>> {
        let k = self.k_or_default(k);
        DenseRetriever::new(Arc::clone(&self.index), self.dense_encoder.dim())
            .retrieve(query_vector, k)
            .await
    }

    pub async fn retrieve_late_interaction(&self, query: &str, k: Option<usize>) -> Result<Vec<ResultRecord>> {
        let encoder = Arc::clone(&self.token_encoder);
        let text = query.to_string();
        let tokens = tokio::task::spawn_blocking(move || encoder.encode_tokens(&text))
            .await
            .map_err(|e| RetrievalError::Internal(format!("token encoder task failed: {e}")))?
            .map_err(|e| RetrievalError::encoder(SearchSpace::Token, e))?;
        self.retrieve_late_interaction_tokens(&tokens, k).await
    }

    /// Late-interaction retrieval for an already encoded query.
    ///
    /// Scoring starts only after every per-token search has returned, so the
    /// ranking does not depend on response order.
    pub async fn retrieve_late_interaction_tokens(
        &self,
        query_tokens: &[Vector],
        k: Option<usize>,
    ) -> Result<Vec<ResultRecord>> {
        let k = self.k_or_default(k);
        if k == 0 {
            return Ok(Vec::new());
        }
        let aggregator = CandidateAggregator::new(
            Arc::clone(&self.index),
            Arc::clone(&self.store),
            self.settings.token_fanout,
            self.settings.search_concurrency,
            self.token_encoder.dim(),
        );
        let candidates = aggregator.aggregate(query_tokens).await?;
        let discovered = candidates.len();
        let scored = score_all(query_tokens, candidates);
        let selected = select(scored, k);
        tracing::debug!(query_tokens = query_tokens.len(), discovered, selected = selected.len(), "late interaction ranked");
        materialize(selected).await
    }

    /// Run both modes for `query`, reporting each outcome separately.
    ///
    /// Late interaction runs first and dense only after it has finished, so
    /// each elapsed time covers that mode alone.
    pub async fn compare(&self, query: &str, k: Option<usize>) -> Comparison {
        let late_interaction = timed(self.retrieve_late_interaction(query, k)).await;
        let dense = timed(self.retrieve_dense(query, k)).await;
        let comparison = Comparison { late_interaction, dense };
        for (space, err) in comparison.failures() {
            tracing::warn!(%space, error = %err, "retrieval mode failed");
        }
        comparison
    }
}
