//! # triage_tools
//!
//! Capability-aggregator adapter for TriageHub.
//!
//! Obtains invocable tool handles for the three external capability
//! groups (GitHub, Notion, Google Calendar) from a hosted aggregator,
//! scoped by an entity identifier, and dispatches the model's tool calls
//! against them.

pub mod composio;
pub mod error;
pub mod tool;

// Re-export main types for convenience
pub use composio::{ActionSchema, App, ComposioClient, RemoteAction, DEFAULT_COMPOSIO_BASE_URL};
pub use error::{ToolError, ToolResult};
pub use tool::{Tool, ToolRegistry};
