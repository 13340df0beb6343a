//! Deterministic hash-based encoders for tests and development.

use anyhow::Result;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use colsearch_core::traits::{DenseEncoder, TokenEncoder};
use colsearch_core::types::Vector;

fn hash_of<T: Hash>(value: T, seed: u64) -> u64 {
    let mut hasher = XxHash64::with_seed(seed);
    value.hash(&mut hasher);
    hasher.finish()
}

fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
    for x in v { *x /= norm; }
}

/// Bag-of-words bucket embedding; texts sharing words land close together.
pub struct FakeDenseEncoder { dim: usize }

impl FakeDenseEncoder {
    pub fn new(dim: usize) -> Self { Self { dim } }
}

impl DenseEncoder for FakeDenseEncoder {
    fn dim(&self) -> usize { self.dim }

    fn encode_dense(&self, text: &str) -> Result<Vector> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let h = hash_of(token.to_lowercase(), 0);
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        normalize(&mut v);
        Ok(v)
    }
}

/// One pseudo-random unit vector per whitespace token.
///
/// The same word always maps to the same vector, so documents indexed with
/// `token_vector` match queries encoded with `encode_tokens`.
pub struct FakeTokenEncoder { dim: usize }

impl FakeTokenEncoder {
    pub fn new(dim: usize) -> Self { Self { dim } }

    pub fn token_vector(&self, token: &str) -> Vector {
        let word = token.to_lowercase();
        let mut v: Vec<f32> = (0..self.dim)
            .map(|j| {
                let h = hash_of((&word, j), 1);
                ((h >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0) as f32
            })
            .collect();
        normalize(&mut v);
        v
    }
}

impl TokenEncoder for FakeTokenEncoder {
    fn dim(&self) -> usize { self.dim }

    fn encode_tokens(&self, text: &str) -> Result<Vec<Vector>> {
        Ok(text.split_whitespace().map(|t| self.token_vector(t)).collect())
    }
}
