//! Error types for the core module.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid repository identifier '{0}': expected 'owner/name'")]
    InvalidRepository(String),

    #[error("Duplicate task name: {0}")]
    DuplicateTask(String),

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("Task '{task}' depends on '{dependency}' which runs later in the pipeline")]
    ForwardDependency { task: String, dependency: String },

    #[error("Pipeline '{0}' has no tasks")]
    EmptyPipeline(String),

    #[error("Task '{task}' failed: {message}")]
    TaskFailed { task: String, message: String },

    #[error("Pipeline '{pipeline}' timed out after {seconds} seconds")]
    Timeout { pipeline: String, seconds: u64 },
}
