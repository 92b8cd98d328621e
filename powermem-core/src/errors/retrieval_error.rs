/// Errors raised by the retrieval pipeline (hybrid search fan-out, fusion, rerank).
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// Every fan-out target errored; a partial result isn't possible
    /// (§10.6 "degraded retrieval" only returns a partial hit set when at
    /// least one store succeeded).
    #[error("all {0} target store(s) failed during search")]
    AllStoresUnavailable(usize),
}
