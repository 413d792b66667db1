//! Error types for the model client.

use thiserror::Error;

/// Result type alias for model operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors from the model endpoint.
///
/// None of these are retried anywhere in the system; call sites that can
/// tolerate a failure substitute a constant instead.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Model endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("Malformed model response: {0}")]
    Malformed(String),
}
