use std::sync::Arc;

use colsearch_core::traits::ChunkStore;
use colsearch_core::ChunkKey;
use colsearch_engine::{maxsim, score, select, BodyFetch, CandidateEvidence, InMemoryChunkStore, ScoredCandidate};

fn evidence(title: &str, chunk_no: i32) -> CandidateEvidence {
    let key = ChunkKey::new(title, chunk_no);
    let store: Arc<dyn ChunkStore> = Arc::new(InMemoryChunkStore::new().with_body(key.clone(), title));
    CandidateEvidence::new(key.clone(), BodyFetch::spawn(store, key))
}

#[test]
fn maxsim_sums_best_match_per_query_token() {
    let q = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
    let d = vec![vec![0.5, 0.1], vec![0.2, 0.9], vec![-1.0, 0.0]];
    // max(0.5, 0.2, -1.0) + max(0.1, 0.9, 0.0)
    let s = maxsim(&q, &d).expect("non-empty");
    assert!((s - 1.4).abs() < 1e-6, "got {s}");
}

#[test]
fn maxsim_is_not_averaged_over_document_length() {
    let q = vec![vec![1.0, 0.0]];
    let short = vec![vec![1.0, 0.0]];
    let long = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, -1.0], vec![-1.0, 0.0]];
    assert_eq!(maxsim(&q, &short), maxsim(&q, &long));
}

#[test]
fn maxsim_uses_raw_dot_product() {
    let q = vec![vec![2.0, 0.0]];
    let d = vec![vec![3.0, 4.0]];
    assert_eq!(maxsim(&q, &d), Some(6.0));
}

#[test]
fn empty_evidence_scores_negative_infinity() {
    let q = vec![vec![1.0, 0.0]];
    assert_eq!(maxsim(&q, &[]), None);
    assert_eq!(score(&q, &[]), f32::NEG_INFINITY);
}

#[tokio::test]
async fn evidence_ignores_repeated_token() {
    let mut e = evidence("a", 0);
    assert!(e.add(Some(3), vec![1.0, 0.0]));
    assert!(!e.add(Some(3), vec![1.0, 0.0]));
    assert!(e.add(Some(4), vec![0.0, 1.0]));
    assert_eq!(e.embeddings().len(), 2);
}

#[tokio::test]
async fn select_orders_by_score_then_key() {
    let scored = vec![
        ScoredCandidate::new(1.0, evidence("b", 0)),
        ScoredCandidate::new(2.0, evidence("z", 5)),
        ScoredCandidate::new(1.0, evidence("a", 7)),
        ScoredCandidate::new(1.0, evidence("a", 2)),
        ScoredCandidate::new(0.5, evidence("c", 0)),
    ];
    let keys: Vec<ChunkKey> = select(scored, 4).iter().map(|c| c.key().clone()).collect();
    assert_eq!(
        keys,
        vec![ChunkKey::new("z", 5), ChunkKey::new("a", 2), ChunkKey::new("a", 7), ChunkKey::new("b", 0)]
    );
}

#[tokio::test]
async fn select_treats_signed_zero_as_a_tie() {
    let scored = vec![ScoredCandidate::new(0.0, evidence("b", 0)), ScoredCandidate::new(-0.0, evidence("a", 0))];
    let keys: Vec<ChunkKey> = select(scored, 2).iter().map(|c| c.key().clone()).collect();
    assert_eq!(keys, vec![ChunkKey::new("a", 0), ChunkKey::new("b", 0)]);
}

#[tokio::test]
async fn select_with_zero_k_is_empty() {
    let scored = vec![ScoredCandidate::new(1.0, evidence("a", 0))];
    assert!(select(scored, 0).is_empty());
}
