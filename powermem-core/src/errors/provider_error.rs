/// Errors raised by LLM, Embedder, SparseEmbedder, and Reranker providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("LLM provider unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM returned malformed output: {0}")]
    LlmMalformed(String),

    #[error("embedder unavailable: {0}")]
    EmbedderUnavailable(String),

    #[error("reranker unavailable: {0}")]
    RerankerUnavailable(String),

    #[error("unknown provider key: {0}")]
    UnknownProvider(String),

    #[error("provider config error: {0}")]
    Config(String),

    #[error("token budget exceeded: needed {needed}, available {available}")]
    TokenBudgetExceeded { needed: usize, available: usize },
}
