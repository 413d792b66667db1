//! # triage_core
//!
//! Core pipeline engine for TriageHub.
//!
//! This crate provides the task graph, the sequential pipeline executor,
//! the environment-sourced settings, and the result envelope shared by the
//! CLI and the tool server.
//!
//! # Architecture
//!
//! - **Tasks**: one instruction plus the agent that owns it and the
//!   upstream tasks whose output it needs
//! - **Pipelines**: validated, strictly sequential compositions of tasks
//! - **Reports**: the success/failure envelope returned to callers
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use triage_core::{PipelineBuilder, TaskSpec};
//!
//! let pipeline = PipelineBuilder::new("github")
//!     .task(TaskSpec::new("fetch_issues", instruction, expected, agent.clone()))
//!     .task(TaskSpec::new("analyze", instruction, expected, agent)
//!         .depends_on(["fetch_issues"]))
//!     .build()?;
//!
//! let run = pipeline.run().await?;
//! println!("{}", run.final_output());
//! ```

pub mod error;
pub mod pipeline;
pub mod report;
pub mod settings;
pub mod task;

// Re-export main types for convenience
pub use error::{CoreError, CoreResult};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineRun};
pub use report::RunReport;
pub use settings::{RepoId, Settings, DEFAULT_LLM_BASE_URL};
pub use task::{TaskAgent, TaskSpec};
