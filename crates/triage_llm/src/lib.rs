//! # triage_llm
//!
//! Model adapter for TriageHub.
//!
//! Provides the OpenAI-compatible chat client used by every agent, the
//! chat/tool wire types, and the two direct helper calls (label
//! classification, meeting-summary generation) with their deterministic
//! fallbacks.

pub mod analysis;
pub mod client;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use analysis::{
    classify_labels, meeting_summary, IssueRef, LabelAnalysis, MeetingUrgency, Priority,
};
pub use client::{ChatClient, ChatProvider};
pub use error::{LlmError, LlmResult};
pub use types::{ChatRequest, ChatResponse, Message, Role, ToolCall, ToolDefinition};
