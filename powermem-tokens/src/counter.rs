use std::sync::OnceLock;

use powermem_core::errors::{PowerMemError, PowerMemResult, ProviderError};

/// tiktoken-rs wrapper for model-aware token counting. Caches the BPE
/// instance for performance since loading it is not free.
pub struct TokenCounter {
    model: String,
    bpe: OnceLock<Option<tiktoken_rs::CoreBPE>>,
}

impl TokenCounter {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            bpe: OnceLock::new(),
        }
    }

    fn get_bpe(&self) -> PowerMemResult<&tiktoken_rs::CoreBPE> {
        let cached = self.bpe.get_or_init(|| {
            tiktoken_rs::get_bpe_from_model(&self.model)
                .or_else(|_| tiktoken_rs::get_bpe_from_model("gpt-4"))
                .ok()
        });
        cached.as_ref().ok_or_else(|| {
            PowerMemError::Provider(ProviderError::Config(format!(
                "failed to load tokenizer for model '{}'",
                self.model
            )))
        })
    }

    pub fn count(&self, text: &str) -> PowerMemResult<usize> {
        Ok(self.get_bpe()?.encode_with_special_tokens(text).len())
    }

    /// Fast approximation (4 chars ≈ 1 token) for call sites that can't
    /// afford a BPE load (e.g. a quick pre-check before extraction runs).
    pub fn count_approximate(text: &str) -> usize {
        text.len().div_ceil(4)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new("gpt-4")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_basic_text() {
        let counter = TokenCounter::new("gpt-4");
        let count = counter.count("Hello, world!").unwrap();
        assert!(count > 0 && count < 10);
    }

    #[test]
    fn empty_string_is_zero_tokens() {
        let counter = TokenCounter::new("gpt-4");
        assert_eq!(counter.count("").unwrap(), 0);
    }

    #[test]
    fn unknown_model_falls_back_to_gpt4() {
        let counter = TokenCounter::new("unknown-model-xyz");
        assert!(counter.count("test text").unwrap() > 0);
    }

    #[test]
    fn approximate_count_is_in_the_right_ballpark() {
        let count = TokenCounter::count_approximate("Hello, world! This is a test.");
        assert!((5..=15).contains(&count));
    }
}
