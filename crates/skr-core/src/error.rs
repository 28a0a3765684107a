/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when loading or checking a script.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The JSON document is not a serialized script.
    #[error("invalid script JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The script violates a structural invariant (ranges, ids).
    #[error("malformed script: {0}")]
    Malformed(String),
}
