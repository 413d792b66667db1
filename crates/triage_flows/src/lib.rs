//! # triage_flows
//!
//! Flow compositions for TriageHub.
//!
//! The nine task templates (three groups of three) and the declarative
//! builder that assembles them into every supported composition level:
//! GitHub alone, Notion or Calendar with externally supplied data, GitHub
//! plus Notion, and the full end-to-end run.

pub mod flow;
pub mod tasks;

// Re-export main types for convenience
pub use flow::{AgentSet, Flow, FlowError, FlowKind, FlowResult};
pub use tasks::{FlowEntry, FlowParams, DATABASE_COLUMNS, DATABASE_TITLE, GITHUB_DATA_SEED};
