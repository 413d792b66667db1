//! Task definitions.
//!
//! A task pairs a natural-language instruction with the agent that owns it
//! and the names of the upstream tasks whose output it needs. Tasks are
//! plain values: the pipeline builder assembles fresh specs per run, so a
//! caller-supplied parameter can never leak into a later invocation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CoreResult;

/// Executes a single task on behalf of the pipeline.
///
/// Implementations hold whatever they need to do the work (model client,
/// remote tool handles). The pipeline only sequences them.
#[async_trait]
pub trait TaskAgent: Send + Sync {
    /// Role name, used in logs and flow descriptions.
    fn role_name(&self) -> &str;

    /// Execute the task, given the concatenated output of its declared
    /// upstream dependencies (`None` when the task has no context).
    async fn execute(&self, task: &TaskSpec, context: Option<&str>) -> CoreResult<String>;
}

/// One step of a pipeline.
#[derive(Clone)]
pub struct TaskSpec {
    /// Unique name within the pipeline.
    pub name: String,
    /// What the agent is asked to do.
    pub instruction: String,
    /// Contract for the shape of the answer.
    pub expected_output: String,
    /// The agent that runs this task.
    pub agent: Arc<dyn TaskAgent>,
    /// Names of upstream tasks whose output feeds this one, in the order
    /// the blobs are concatenated.
    pub context: Vec<String>,
}

impl TaskSpec {
    pub fn new(
        name: impl Into<String>,
        instruction: impl Into<String>,
        expected_output: impl Into<String>,
        agent: Arc<dyn TaskAgent>,
    ) -> Self {
        Self {
            name: name.into(),
            instruction: instruction.into(),
            expected_output: expected_output.into(),
            agent,
            context: Vec::new(),
        }
    }

    /// Declare upstream dependencies.
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context.extend(deps.into_iter().map(Into::into));
        self
    }
}

impl std::fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSpec")
            .field("name", &self.name)
            .field("agent", &self.agent.role_name())
            .field("context", &self.context)
            .finish()
    }
}
