use colsearch_core::config::EmbeddingSettings;
use colsearch_core::traits::{DenseEncoder, TokenEncoder};
use colsearch_embed::{load_encoders, query_layout, FakeDenseEncoder, FakeTokenEncoder, SpecialIds};

fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn fake_dense_shapes_and_determinism() {
    let encoder = FakeDenseEncoder::new(384);
    let v1 = encoder.encode_dense("hello world").expect("encode");
    let v2 = encoder.encode_dense("hello world").expect("encode");
    assert_eq!(v1.len(), 384, "embedding dim is 384");
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_tokens_one_vector_per_word() {
    let encoder = FakeTokenEncoder::new(128);
    let tokens = encoder.encode_tokens("Who wrote Hamlet").expect("encode");
    assert_eq!(tokens.len(), 3);
    for t in &tokens { assert_eq!(t.len(), 128); }
    // Same word, any case, same vector.
    let hamlet = encoder.token_vector("hamlet");
    assert!((dot(&tokens[2], &hamlet) - 1.0).abs() < 1e-5);
    // Different words are far apart.
    assert!(dot(&tokens[0], &tokens[2]).abs() < 0.5);
}

#[test]
fn fake_tokens_empty_query_has_no_tokens() {
    let encoder = FakeTokenEncoder::new(16);
    assert!(encoder.encode_tokens("   ").expect("encode").is_empty());
}

#[test]
fn load_encoders_honours_use_fake() {
    let settings = EmbeddingSettings { use_fake: true, dense_dim: 32, token_dim: 8, ..Default::default() };
    let encoders = load_encoders(&settings).expect("fake encoders load without model files");
    assert_eq!(encoders.dense.dim(), 32);
    assert_eq!(encoders.tokens.dim(), 8);
}

const SPECIAL: SpecialIds = SpecialIds { cls: 101, sep: 102, mask: 103, query: 1 };

#[test]
fn short_query_is_framed_and_padded_with_masks() {
    let (ids, mask) = query_layout(&[2000, 2001], &SPECIAL, 8);
    assert_eq!(ids, vec![101, 1, 2000, 2001, 102, 103, 103, 103]);
    assert_eq!(mask, vec![1, 1, 1, 1, 1, 0, 0, 0]);
}

#[test]
fn long_query_is_truncated_before_sep() {
    let body: Vec<u32> = (2000..2010).collect();
    let (ids, mask) = query_layout(&body, &SPECIAL, 6);
    assert_eq!(ids, vec![101, 1, 2000, 2001, 2002, 102]);
    assert_eq!(mask, vec![1; 6]);
}

#[test]
fn minimal_query_length_keeps_only_the_frame() {
    let (ids, mask) = query_layout(&[2000, 2001], &SPECIAL, 3);
    assert_eq!(ids, vec![101, 1, 102]);
    assert_eq!(mask, vec![1, 1, 1]);
    let (ids, _) = query_layout(&[], &SPECIAL, 3);
    assert_eq!(ids, vec![101, 1, 102]);
}
