//! The embedding capability contract.
//!
//! This abstracts over whatever actually turns text into vectors, so a real
//! model-backed provider can be swapped in later without touching the
//! indexing pipeline or search.

use crate::error::EmbeddingResult;
use async_trait::async_trait;

/// Generates embedding vectors for text. Implementations may be pooled,
/// batched, remote, or (as here) a deterministic local default.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate one embedding per input text, in order.
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Dimensionality of embeddings this provider produces.
    fn embedding_dimension(&self) -> usize;

    /// Maximum tokens this provider's model can accept per input.
    fn max_tokens(&self) -> usize;

    /// Model identifier, surfaced in `EmbeddingRecord.model`.
    fn model_name(&self) -> &str;

    /// Whether the provider can currently serve requests.
    async fn is_ready(&self) -> bool;

    /// Block until the provider is ready, loading any lazy state.
    async fn ensure_ready(&self) -> EmbeddingResult<()>;
}

/// Coordinates embedding generation: batching, stats, provider lifecycle.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generate embeddings for `texts`, batching internally per the
    /// configured batch size.
    async fn generate_embeddings(&self, texts: Vec<&str>) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// The provider backing this service.
    fn provider(&self) -> &dyn EmbeddingProvider;

    /// A snapshot of this service's running statistics.
    async fn get_stats(&self) -> EmbeddingStats;
}

/// Running statistics about embedding generation, surfaced via `get_status`.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingStats {
    /// Total embeddings generated across all batches.
    pub total_embeddings: usize,
    /// Total batches processed.
    pub total_batches: usize,
    /// Running average batch processing time, in milliseconds.
    pub avg_batch_time_ms: f64,
    /// Model identifier.
    pub model_name: String,
    /// Embedding dimension.
    pub embedding_dimension: usize,
}
