//! Tiktoken-based token counter for OpenAI-family models.

use super::traits::TokenCounter;
use anyhow::Result;
use tiktoken_rs::{cl100k_base, o200k_base, p50k_base, p50k_edit, r50k_base, CoreBPE};

/// Token counter backed by an actual tiktoken BPE encoder, picked by model
/// name pattern.
pub struct TiktokenCounter {
    model_name: String,
    encoder: CoreBPE,
    max_tokens: usize,
}

impl TiktokenCounter {
    /// Create a counter for `model_name`, selecting the matching encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying tiktoken encoding fails to load.
    pub fn new(model_name: &str, max_tokens: usize) -> Result<Self> {
        let encoder = Self::encoder_for_model(model_name)?;
        Ok(Self {
            model_name: model_name.to_string(),
            encoder,
            max_tokens,
        })
    }

    fn encoder_for_model(model_name: &str) -> Result<CoreBPE> {
        let encoder = match model_name {
            name if name.starts_with("gpt-4") || name.starts_with("gpt-3.5") => cl100k_base()?,
            name if name.starts_with("gpt-5") || name.starts_with("o1") => o200k_base()?,
            name if name.starts_with("text-davinci") || name.starts_with("text-curie") => {
                p50k_base()?
            }
            name if name.starts_with("code-") => p50k_base()?,
            name if name.contains("-edit") => p50k_edit()?,
            name if name.starts_with("davinci") || name.starts_with("curie") => r50k_base()?,
            _ => cl100k_base()?,
        };
        Ok(encoder)
    }
}

impl TokenCounter for TiktokenCounter {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn count(&self, text: &str) -> usize {
        self.encoder.encode_ordinary(text).len()
    }

    fn count_batch(&self, texts: &[&str]) -> Vec<usize> {
        texts
            .iter()
            .map(|text| self.encoder.encode_ordinary(text).len())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_a_simple_sentence() {
        let counter = TiktokenCounter::new("gpt-4", 8192).unwrap();
        let count = counter.count("Hello, world!");
        assert!(count > 0 && count <= 5, "got {count}");
    }

    #[test]
    fn empty_text_counts_zero() {
        let counter = TiktokenCounter::new("gpt-4", 8192).unwrap();
        assert_eq!(counter.count(""), 0);
    }
}
