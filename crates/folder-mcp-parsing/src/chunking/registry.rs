//! Token counter registry, dispatching by model id.

use super::heuristic_counter::HeuristicCounter;
use super::tiktoken_counter::TiktokenCounter;
use super::traits::TokenCounterRef;
use std::collections::HashMap;
use std::sync::Arc;

/// Holds one [`TokenCounterRef`] per known model id, falling back to a
/// heuristic counter for anything unregistered — including the default
/// embedding model, since its tokenizer is itself a capability contract
/// this workspace doesn't implement.
pub struct TokenCounterRegistry {
    counters: HashMap<String, TokenCounterRef>,
    default_counter: TokenCounterRef,
}

impl TokenCounterRegistry {
    /// Build a registry pre-populated with the common OpenAI-family tiktoken
    /// encodings, plus the heuristic fallback.
    #[must_use]
    pub fn new() -> Self {
        let mut counters: HashMap<String, TokenCounterRef> = HashMap::new();

        let openai_models: &[(&str, usize)] = &[
            ("gpt-4", 8192),
            ("gpt-4-turbo", 128_000),
            ("gpt-4o", 128_000),
            ("gpt-4o-mini", 128_000),
            ("gpt-3.5-turbo", 16_384),
            ("o1-mini", 128_000),
            ("o1-preview", 128_000),
        ];

        for (model, max_tokens) in openai_models {
            if let Ok(counter) = TiktokenCounter::new(model, *max_tokens) {
                counters.insert((*model).to_string(), Arc::new(counter));
            }
        }

        let default_counter: TokenCounterRef = Arc::new(HeuristicCounter::new(
            "heuristic-fallback",
            8192,
        ));

        Self {
            counters,
            default_counter,
        }
    }

    /// Look up the counter for `model_id`, falling back to prefix matching
    /// and finally the heuristic counter.
    #[must_use]
    pub fn for_model(&self, model_id: &str) -> TokenCounterRef {
        if let Some(counter) = self.counters.get(model_id) {
            return counter.clone();
        }

        for (key, counter) in &self.counters {
            if model_id.starts_with(key.as_str()) || key.starts_with(model_id) {
                return counter.clone();
            }
        }

        self.default_counter.clone()
    }

    /// The heuristic fallback counter, used for unregistered models.
    #[must_use]
    pub fn default_counter(&self) -> TokenCounterRef {
        self.default_counter.clone()
    }

    /// Register or override the counter for `model_id`.
    pub fn register(&mut self, model_id: String, counter: TokenCounterRef) {
        self.counters.insert(model_id, counter);
    }
}

impl Default for TokenCounterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_resolves_to_its_own_counter() {
        let registry = TokenCounterRegistry::new();
        let counter = registry.for_model("gpt-4");
        assert_eq!(counter.name(), "gpt-4");
    }

    #[test]
    fn unknown_model_falls_back_to_heuristic() {
        let registry = TokenCounterRegistry::new();
        let counter = registry.for_model("local-default");
        assert_eq!(counter.name(), "heuristic-fallback");
    }
}
