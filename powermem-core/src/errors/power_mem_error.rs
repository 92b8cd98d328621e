use super::{
    FilterError, IngestError, ProfileError, ProviderError, RetentionError, RetrievalError,
    RouterError, StorageError,
};

/// Top-level error type for the PowerMem memory engine.
/// All subsystem errors convert into this via `From` impls so callers at
/// the facade boundary only ever match one enum.
#[derive(Debug, thiserror::Error)]
pub enum PowerMemError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("memory not found: {id}")]
    NotFound { id: String },

    #[error("unauthorized: caller scope does not include this record")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("router error: {0}")]
    Router(String),

    #[error("retention error: {0}")]
    Retention(#[from] RetentionError),

    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("filter error: {0}")]
    Filter(String),

    #[error("unsupported filter operator: {0}")]
    UnsupportedFilterOp(String),

    #[error("sub-store not active: {0}")]
    SubStoreNotActive(String),

    #[error("migration already in progress: {0}")]
    MigrationInProgress(String),

    #[error("invariant violated ({code}): {detail}")]
    Fatal { code: &'static str, detail: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<RouterError> for PowerMemError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::SubStoreNotActive(name) => PowerMemError::SubStoreNotActive(name),
            RouterError::MigrationInProgress(name) => PowerMemError::MigrationInProgress(name),
            other => PowerMemError::Router(other.to_string()),
        }
    }
}

impl From<FilterError> for PowerMemError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::UnsupportedOp { backend, op } => {
                PowerMemError::UnsupportedFilterOp(format!("{op} (backend: {backend})"))
            }
            other => PowerMemError::Filter(other.to_string()),
        }
    }
}

/// Convenience alias used across every PowerMem crate.
pub type PowerMemResult<T> = Result<T, PowerMemError>;
