//! Batching wrapper around an [`EmbeddingProvider`].

use crate::error::EmbeddingResult;
use crate::traits::{EmbeddingProvider, EmbeddingService, EmbeddingStats};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Splits incoming text into provider-sized batches and tracks running
/// throughput stats, the way the teacher's service layers batching on top
/// of a raw model client.
pub struct DefaultEmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    stats: RwLock<EmbeddingStats>,
}

impl DefaultEmbeddingService {
    /// Build a service batching at most `batch_size` texts per provider call.
    #[must_use]
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        let stats = EmbeddingStats {
            model_name: provider.model_name().to_string(),
            embedding_dimension: provider.embedding_dimension(),
            ..EmbeddingStats::default()
        };
        Self {
            provider,
            batch_size: batch_size.max(1),
            stats: RwLock::new(stats),
        }
    }

    async fn record_batch(&self, count: usize, elapsed_ms: f64) {
        let mut stats = self.stats.write().await;
        let total_before = stats.total_batches as f64;
        stats.total_embeddings += count;
        stats.total_batches += 1;
        stats.avg_batch_time_ms =
            (stats.avg_batch_time_ms * total_before + elapsed_ms) / stats.total_batches as f64;
    }
}

#[async_trait]
impl EmbeddingService for DefaultEmbeddingService {
    async fn generate_embeddings(&self, texts: Vec<&str>) -> EmbeddingResult<Vec<Vec<f32>>> {
        self.provider.ensure_ready().await?;

        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let started = Instant::now();
            let embeddings = self.provider.embed_batch(batch).await?;
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            debug!(batch_len = batch.len(), elapsed_ms, "embedded batch");
            self.record_batch(batch.len(), elapsed_ms).await;
            out.extend(embeddings);
        }
        Ok(out)
    }

    fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    async fn get_stats(&self) -> EmbeddingStats {
        self.stats.read().await.clone()
    }
}

#[cfg(test)]
pub(crate) struct MockEmbeddingProvider {
    pub dimension: usize,
}

#[cfg(test)]
#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.0; self.dimension]).collect())
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn max_tokens(&self) -> usize {
        8192
    }

    fn model_name(&self) -> &str {
        "mock"
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
    async fn batches_texts_per_configured_size() {
        let provider = Arc::new(MockEmbeddingProvider { dimension: 4 });
        let service = DefaultEmbeddingService::new(provider, 2);
        let texts = vec!["a", "b", "c", "d", "e"];
        let embeddings = service.generate_embeddings(texts).await.unwrap();
        assert_eq!(embeddings.len(), 5);

        let stats = service.get_stats().await;
        assert_eq!(stats.total_embeddings, 5);
        assert_eq!(stats.total_batches, 3);
    }

    #[tokio::test]
    async fn stats_start_empty() {
        let provider = Arc::new(MockEmbeddingProvider { dimension: 4 });
        let service = DefaultEmbeddingService::new(provider, 32);
        let stats = service.get_stats().await;
        assert_eq!(stats.total_embeddings, 0);
        assert_eq!(stats.embedding_dimension, 4);
    }
}
