//! Trait definitions for token counting.

use std::sync::Arc;

/// Counts tokens in text under some model's tokenization scheme.
///
/// Embedding model tokenization itself is a capability contract (the model
/// runtime is out of scope), but token counting is not: the chunker needs
/// it to stay within a model's context window regardless of which provider
/// ultimately embeds the chunk.
pub trait TokenCounter: Send + Sync {
    /// Identifier for this counter, usually a model name.
    fn name(&self) -> &str;

    /// Maximum tokens the associated model can handle in one input.
    fn max_tokens(&self) -> usize;

    /// Count tokens in `text`. Fast and deterministic for the same input.
    fn count(&self, text: &str) -> usize;

    /// Count tokens for multiple texts; override for batch efficiency.
    fn count_batch(&self, texts: &[&str]) -> Vec<usize> {
        texts.iter().map(|text| self.count(text)).collect()
    }
}

/// Shared handle to a [`TokenCounter`].
pub type TokenCounterRef = Arc<dyn TokenCounter>;
