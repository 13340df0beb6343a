//! MaxSim late-interaction scoring.
//!
//! For each query token, take its best dot product against the candidate's
//! known document tokens, then sum over query tokens. No normalisation and no
//! length averaging. Only the document tokens that surfaced in some ANN search
//! are considered, so a score is a lower bound of the chunk's full MaxSim.

use colsearch_core::types::Vector;

use crate::aggregator::Candidates;
use crate::topk::ScoredCandidate;

#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Sum over query tokens of the best-matching document token's similarity.
///
/// `None` when there are no document tokens to match against.
pub fn maxsim(query_tokens: &[Vector], doc_tokens: &[Vector]) -> Option<f32> {
    if doc_tokens.is_empty() {
        return None;
    }
    Some(
        query_tokens
            .iter()
            .map(|q| doc_tokens.iter().map(|d| dot(q, d)).fold(f32::NEG_INFINITY, f32::max))
            .sum(),
    )
}

/// MaxSim score, with an empty token set scoring negative infinity.
pub fn score(query_tokens: &[Vector], doc_tokens: &[Vector]) -> f32 {
    maxsim(query_tokens, doc_tokens).unwrap_or(f32::NEG_INFINITY)
}

/// Score every candidate. Candidates with no usable score are dropped.
pub fn score_all(query_tokens: &[Vector], candidates: Candidates) -> Vec<ScoredCandidate> {
    candidates
        .into_values()
        .filter_map(|evidence| {
            let s = score(query_tokens, evidence.embeddings());
            if s == f32::NEG_INFINITY || s.is_nan() {
                tracing::warn!(key = %evidence.key(), "candidate has no scorable evidence; excluded");
                return None;
            }
            Some(ScoredCandidate::new(s, evidence))
        })
        .collect()
}
