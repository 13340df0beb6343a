use std::cmp::Ordering;

use colsearch_core::types::ChunkKey;

use crate::aggregator::CandidateEvidence;

/// A candidate with its MaxSim score; owns the evidence (and body fetch).
pub struct ScoredCandidate {
    pub score: f32,
    pub evidence: CandidateEvidence,
}

impl ScoredCandidate {
    pub fn new(score: f32, evidence: CandidateEvidence) -> Self {
        Self { score, evidence }
    }

    pub fn key(&self) -> &ChunkKey { self.evidence.key() }
}

/// Descending score; equal scores fall back to ascending `(title, chunk_no)`.
fn rank(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    // `+ 0.0` turns -0.0 into 0.0 so the two compare equal.
    (b.score + 0.0)
        .total_cmp(&(a.score + 0.0))
        .then_with(|| a.key().cmp(b.key()))
}

/// The `k` best candidates in rank order. The rest are dropped here, which
/// cancels their outstanding body fetches.
pub fn select(mut scored: Vec<ScoredCandidate>, k: usize) -> Vec<ScoredCandidate> {
    scored.sort_by(rank);
    scored.truncate(k);
    scored
}
