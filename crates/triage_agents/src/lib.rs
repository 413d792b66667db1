//! # triage_agents
//!
//! Integration agents for TriageHub.
//!
//! Each agent pairs a persona (role, goal, backstory) with one capability
//! group's tool handles and the shared model client. The runtime executes
//! a task as a bounded tool-calling conversation; all cross-agent
//! sequencing is the pipeline's job, never the agents'.

pub mod error;
pub mod role;
pub mod runtime;

// Re-export main types for convenience
pub use error::{AgentError, AgentResult};
pub use role::{AgentProfile, AgentRole};
pub use runtime::AgentRuntime;
