//! Deterministic feature-hashing embedder.
//!
//! Each token is hashed (FNV-1a) into one of `dimensions` buckets with a
//! sign bit, and the resulting vector is L2-normalized. No model, no
//! network; similar wording gives similar vectors.

use super::scoring::tokenize;
use async_trait::async_trait;
use counsel_application::ports::retrieval::{EmbeddingPort, RetrievalError};

pub const DEFAULT_DIMENSIONS: usize = 256;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

#[async_trait]
impl EmbeddingPort for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        Ok(self.embed_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::scoring::cosine;

    #[test]
    fn test_embedding_is_normalized_and_deterministic() {
        let embedder = HashingEmbedder::new();
        let a = embedder.embed_text("limitation period for contract claims");
        let b = embedder.embed_text("limitation period for contract claims");
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIMENSIONS);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_similar_text_scores_higher() {
        let embedder = HashingEmbedder::new();
        let query = embedder.embed_text("contract limitation period");
        let close = embedder.embed_text("the limitation period for a contract claim");
        let far = embedder.embed_text("hearing scheduled at the district court");
        assert!(cosine(&query, &close) > cosine(&query, &far));
    }

    #[test]
    fn test_empty_text_gives_zero_vector() {
        let vector = HashingEmbedder::with_dimensions(8).embed_text("  ");
        assert!(vector.iter().all(|x| *x == 0.0));
    }
}
