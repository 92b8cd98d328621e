use super::FilterError;

/// Errors raised by a `VectorStore` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("memory not found: {id}")]
    NotFound { id: String },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("collection '{0}' does not exist")]
    NoSuchCollection(String),

    #[error("store backend unavailable: {0}")]
    Unavailable(String),

    #[error("sqlite error: {0}")]
    Sqlite(String),

    #[error("schema migration v{version:03} failed: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
