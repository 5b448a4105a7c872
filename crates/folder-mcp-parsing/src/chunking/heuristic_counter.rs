//! Heuristic-based token counter for fast, dependency-free estimation.

use super::traits::TokenCounter;

/// Fast heuristic token counter, used as the default fallback whenever a
/// model has no registered tiktoken encoding.
///
/// Estimates ~4 characters per token for word characters, and treats
/// punctuation and other non-word, non-whitespace characters as mostly
/// becoming their own token.
pub struct HeuristicCounter {
    name: String,
    max_tokens: usize,
    chars_per_token: f64,
}

impl HeuristicCounter {
    /// Create a heuristic counter with the default 4.0 chars-per-token ratio.
    #[must_use]
    pub fn new(name: &str, max_tokens: usize) -> Self {
        Self {
            name: name.to_string(),
            max_tokens,
            chars_per_token: 4.0,
        }
    }

    fn estimate_tokens(&self, text: &str) -> usize {
        let mut word_chars = 0usize;
        let mut whitespace = 0usize;
        let mut punctuation = 0usize;
        let mut other = 0usize;

        for ch in text.chars() {
            if ch.is_alphanumeric() {
                word_chars += 1;
            } else if ch.is_whitespace() {
                whitespace += 1;
            } else if ch.is_ascii_punctuation() {
                punctuation += 1;
            } else {
                other += 1;
            }
        }

        let estimated = (word_chars as f64 / self.chars_per_token)
            + (punctuation as f64 * 0.8)
            + (other as f64 * 0.9)
            + (whitespace as f64 * 0.1);

        estimated.ceil() as usize
    }
}

impl TokenCounter for HeuristicCounter {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            0
        } else {
            self.estimate_tokens(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_counts_zero() {
        let counter = HeuristicCounter::new("heuristic", 8192);
        assert_eq!(counter.count(""), 0);
    }

    #[test]
    fn basic_estimation_is_in_a_sane_range() {
        let counter = HeuristicCounter::new("heuristic", 8192);
        let count = counter.count("The quick brown fox jumps over the lazy dog");
        assert!((8..=14).contains(&count), "got {count}");
    }

    #[test]
    fn punctuation_increases_token_count() {
        let counter = HeuristicCounter::new("heuristic", 8192);
        let with_punct = counter.count("Hello, world! How are you?");
        let without_punct = counter.count("Hello world How are you");
        assert!(with_punct > without_punct);
    }
}
