mod filter_error;
mod ingest_error;
mod power_mem_error;
mod profile_error;
mod provider_error;
mod retention_error;
mod retrieval_error;
mod router_error;
mod storage_error;

pub use filter_error::FilterError;
pub use ingest_error::IngestError;
pub use power_mem_error::{PowerMemError, PowerMemResult};
pub use profile_error::ProfileError;
pub use provider_error::ProviderError;
pub use retention_error::RetentionError;
pub use retrieval_error::RetrievalError;
pub use router_error::RouterError;
pub use storage_error::StorageError;
