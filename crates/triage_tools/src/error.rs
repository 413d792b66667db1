//! Error types for tool handling.

use thiserror::Error;

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors from tool lookup, acquisition, or remote execution.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Aggregator returned {status}: {body}")]
    Aggregator { status: u16, body: String },

    #[error("No active {app} connection for entity '{entity}'")]
    NoConnection { app: String, entity: String },

    #[error("Malformed aggregator response: {0}")]
    Malformed(String),

    #[error("Action '{action}' failed: {message}")]
    ActionFailed { action: String, message: String },
}
