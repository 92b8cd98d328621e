/// Errors raised by the ingest pipeline (fact extraction → reconciliation → apply).
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("LLM unavailable during fact extraction: {0}")]
    LlmUnavailable(String),

    #[error("embedding failed for fact: {0}")]
    FactEmbeddingFailed(String),

    #[error("store write failed: {0}")]
    StoreWriteFailed(String),

    #[error("empty content is not a valid memory")]
    EmptyContent,

    #[error("malformed fact-extraction response: {0}")]
    MalformedExtraction(String),
}
