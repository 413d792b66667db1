//! Error types for agent execution.

use thiserror::Error;

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors from one agent's task execution.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Model error: {0}")]
    Llm(#[from] triage_llm::LlmError),

    #[error("Tool error: {0}")]
    Tool(#[from] triage_tools::ToolError),

    #[error("Tool budget exhausted after {0} rounds")]
    ToolBudgetExhausted(u32),

    #[error("Agent '{agent}' timed out after {seconds} seconds")]
    Timeout { agent: String, seconds: u64 },
}
