//! Deterministic default [`EmbeddingProvider`].
//!
//! Produces a stable, L2-normalized vector for any input text without a
//! model runtime. Good enough to exercise chunking, storage, and similarity
//! search end-to-end; a real model-backed provider can implement the same
//! trait later without touching callers.

use crate::error::EmbeddingResult;
use crate::traits::EmbeddingProvider;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;

/// Embeds text by hashing it into a fixed-dimension unit vector.
///
/// Concurrency is bounded by a semaphore sized like the teacher's model
/// pool (`pool_size` permits), standing in for the per-worker exclusive
/// model access a real inference backend would need — this provider holds
/// no such exclusive state, so a plain semaphore is the honest analogue.
pub struct DefaultEmbeddingProvider {
    model_name: String,
    dimension: usize,
    max_tokens: usize,
    concurrency: Semaphore,
}

impl DefaultEmbeddingProvider {
    /// Build a provider producing `dimension`-length vectors under
    /// `model_name`, allowing up to `pool_size` concurrent `embed_batch`
    /// calls.
    #[must_use]
    pub fn new(model_name: impl Into<String>, dimension: usize, max_tokens: usize, pool_size: usize) -> Self {
        Self {
            model_name: model_name.into(),
            dimension,
            max_tokens,
            concurrency: Semaphore::new(pool_size.max(1)),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = Vec::with_capacity(self.dimension);
        let mut counter: u32 = 0;

        while vector.len() < self.dimension {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            hasher.update(counter.to_le_bytes());
            let digest = hasher.finalize();

            for chunk in digest.chunks_exact(4) {
                if vector.len() >= self.dimension {
                    break;
                }
                let raw = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                let unit = f64::from(raw) / f64::from(u32::MAX);
                vector.push((unit * 2.0 - 1.0) as f32);
            }

            counter += 1;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vector {
                *v /= norm;
            }
        }

        vector
    }
}

#[async_trait]
impl EmbeddingProvider for DefaultEmbeddingProvider {
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let _permit = self
            .concurrency
            .acquire()
            .await
            .expect("semaphore is never closed");
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn is_ready(&self) -> bool {
        true
    }

    async fn ensure_ready(&self) -> EmbeddingResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn produces_the_requested_dimension() {
        let provider = DefaultEmbeddingProvider::new("local-default", 384, 512, 2);
        let embeddings = provider.embed_batch(&["hello"]).await.unwrap();
        assert_eq!(embeddings[0].len(), 384);
    }

    #[tokio::test]
    async fn is_deterministic() {
        let provider = DefaultEmbeddingProvider::new("local-default", 64, 512, 2);
        let a = provider.embed_batch(&["same text"]).await.unwrap();
        let b = provider.embed_batch(&["same text"]).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn differs_across_inputs() {
        let provider = DefaultEmbeddingProvider::new("local-default", 64, 512, 2);
        let a = provider.embed_batch(&["alpha"]).await.unwrap();
        let b = provider.embed_batch(&["beta"]).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn vectors_are_unit_normalized() {
        let provider = DefaultEmbeddingProvider::new("local-default", 128, 512, 2);
        let embeddings = provider.embed_batch(&["normalize me"]).await.unwrap();
        let norm: f32 = embeddings[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01, "norm was {norm}");
    }
}
