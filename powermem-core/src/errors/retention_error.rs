/// Errors raised by the retention / reclassification engines.
#[derive(Debug, thiserror::Error)]
pub enum RetentionError {
    #[error("retention block missing from memory metadata for id {0}")]
    MissingBlock(String),

    #[error("malformed retention block: {0}")]
    Malformed(String),
}
