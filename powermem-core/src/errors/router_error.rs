/// Errors raised by the sub-store router.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("sub-store '{0}' is not active")]
    SubStoreNotActive(String),

    #[error("migration already in progress for sub-store '{0}'")]
    MigrationInProgress(String),

    #[error("sub-store '{0}' is in a failed state: {1}")]
    SubStoreFailed(String, String),

    #[error("unknown sub-store index: {0}")]
    UnknownSubStore(usize),

    #[error("routing is not deterministic for this record: {0}")]
    NonDeterministicRouting(String),
}
