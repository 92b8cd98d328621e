/// Errors raised while parsing or compiling a filter expression.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("unsupported filter operator '{op}' on backend '{backend}'")]
    UnsupportedOp { backend: String, op: String },

    #[error("malformed filter expression: {0}")]
    Malformed(String),

    #[error("filter references unknown field path: {0}")]
    UnknownField(String),
}
