/// Errors raised by the user-profile store.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("profile not found for user '{0}'")]
    NotFound(String),

    #[error("profile extraction failed: {0}")]
    ExtractionFailed(String),
}
