//! Pipeline assembly and sequential execution.
//!
//! A pipeline is an ordered list of tasks. Execution is strictly
//! sequential in list order; independent tasks are not parallelized. Each
//! task's output becomes available as context to every later task that
//! declares it as a dependency.
//!
//! The builder validates the dependency wiring up front: a task may only
//! reference tasks that occur earlier in the list (or a seeded input), so
//! a topologically unsound composition is rejected before anything runs.

use std::time::Duration;

use tracing::{error, info};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::task::TaskSpec;

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    name: String,
    tasks: Vec<TaskSpec>,
    seeds: Vec<(String, String)>,
    timeout: Duration,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
            seeds: Vec::new(),
            timeout: Duration::from_secs(600),
        }
    }

    /// Append a task. List order is execution order.
    pub fn task(mut self, task: TaskSpec) -> Self {
        self.tasks.push(task);
        self
    }

    /// Seed an externally supplied blob under a name tasks may depend on.
    ///
    /// Seeds behave like the output of a task that ran before everything
    /// else; they are how caller data enters a pipeline without mutating
    /// any task instruction.
    pub fn seed(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.seeds.push((name.into(), text.into()));
        self
    }

    /// Wall-clock bound for the whole run.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the wiring and produce the pipeline.
    pub fn build(self) -> CoreResult<Pipeline> {
        if self.tasks.is_empty() {
            return Err(CoreError::EmptyPipeline(self.name));
        }

        let mut known: Vec<&str> = self.seeds.iter().map(|(n, _)| n.as_str()).collect();
        for (index, task) in self.tasks.iter().enumerate() {
            if known.contains(&task.name.as_str()) {
                return Err(CoreError::DuplicateTask(task.name.clone()));
            }
            for dep in &task.context {
                if known.contains(&dep.as_str()) {
                    continue;
                }
                // Distinguish "never defined" from "defined but later".
                let defined_later = self.tasks[index..].iter().any(|t| &t.name == dep);
                return Err(if defined_later {
                    CoreError::ForwardDependency {
                        task: task.name.clone(),
                        dependency: dep.clone(),
                    }
                } else {
                    CoreError::UnknownDependency {
                        task: task.name.clone(),
                        dependency: dep.clone(),
                    }
                });
            }
            known.push(task.name.as_str());
        }

        Ok(Pipeline {
            name: self.name,
            tasks: self.tasks,
            seeds: self.seeds,
            timeout: self.timeout,
        })
    }
}

/// A validated, ready-to-run pipeline.
#[derive(Debug)]
pub struct Pipeline {
    name: String,
    tasks: Vec<TaskSpec>,
    seeds: Vec<(String, String)>,
    timeout: Duration,
}

impl Pipeline {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Position of a task in execution order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.name == name)
    }

    /// Distinct agent role names, in first-appearance order.
    pub fn agent_roles(&self) -> Vec<&str> {
        let mut roles: Vec<&str> = Vec::new();
        for task in &self.tasks {
            let role = task.agent.role_name();
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        roles
    }

    /// Run every task in order. First failure aborts the remainder; the
    /// whole run is bounded by the configured wall-clock timeout.
    pub async fn run(&self) -> CoreResult<PipelineRun> {
        let run_id = Uuid::new_v4();
        info!(pipeline = %self.name, %run_id, tasks = self.tasks.len(), "starting pipeline");

        let seconds = self.timeout.as_secs();
        match tokio::time::timeout(self.timeout, self.run_inner()).await {
            Ok(result) => result,
            Err(_) => {
                error!(pipeline = %self.name, seconds, "pipeline timed out");
                Err(CoreError::Timeout {
                    pipeline: self.name.clone(),
                    seconds,
                })
            }
        }
    }

    async fn run_inner(&self) -> CoreResult<PipelineRun> {
        let mut outputs: Vec<(String, String)> = self.seeds.clone();

        for (index, task) in self.tasks.iter().enumerate() {
            info!(
                task = %task.name,
                agent = task.agent.role_name(),
                step = index + 1,
                total = self.tasks.len(),
                "executing task"
            );

            let context = gather_context(task, &outputs);
            let output = task
                .agent
                .execute(task, context.as_deref())
                .await
                .map_err(|e| {
                    error!(task = %task.name, error = %e, "task failed");
                    CoreError::TaskFailed {
                        task: task.name.clone(),
                        message: e.to_string(),
                    }
                })?;

            outputs.push((task.name.clone(), output));
        }

        info!(pipeline = %self.name, "pipeline completed");
        Ok(PipelineRun { outputs })
    }
}

/// Concatenate the declared dependencies' blobs, in declaration order,
/// each introduced by a header naming the producing task.
fn gather_context(task: &TaskSpec, outputs: &[(String, String)]) -> Option<String> {
    if task.context.is_empty() {
        return None;
    }

    let mut text = String::new();
    for dep in &task.context {
        // Builder validation guarantees the dependency is present.
        if let Some((_, blob)) = outputs.iter().find(|(name, _)| name == dep) {
            text.push_str(&format!("### Output of {dep}\n{blob}\n\n"));
        }
    }
    Some(text)
}

/// Outputs of a completed run, in execution order (seeds first).
#[derive(Debug, Clone)]
pub struct PipelineRun {
    outputs: Vec<(String, String)>,
}

impl PipelineRun {
    /// Output of a named task.
    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, blob)| blob.as_str())
    }

    /// Output of the last task, which is the pipeline's overall result.
    pub fn final_output(&self) -> &str {
        self.outputs
            .last()
            .map(|(_, blob)| blob.as_str())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::task::TaskAgent;

    /// Echoes its own name plus whatever context it received.
    struct EchoAgent;

    #[async_trait]
    impl TaskAgent for EchoAgent {
        fn role_name(&self) -> &str {
            "echo"
        }

        async fn execute(&self, task: &TaskSpec, context: Option<&str>) -> CoreResult<String> {
            match context {
                Some(ctx) => Ok(format!("{}<<{}>>", task.name, ctx)),
                None => Ok(task.name.clone()),
            }
        }
    }

    struct FailingAgent;

    #[async_trait]
    impl TaskAgent for FailingAgent {
        fn role_name(&self) -> &str {
            "failing"
        }

        async fn execute(&self, _task: &TaskSpec, _context: Option<&str>) -> CoreResult<String> {
            Err(CoreError::TaskFailed {
                task: "inner".to_string(),
                message: "boom".to_string(),
            })
        }
    }

    fn spec(name: &str, agent: Arc<dyn TaskAgent>) -> TaskSpec {
        TaskSpec::new(name, format!("do {name}"), "text", agent)
    }

    #[tokio::test]
    async fn test_sequential_run_passes_context_in_declared_order() {
        let agent: Arc<dyn TaskAgent> = Arc::new(EchoAgent);
        let pipeline = PipelineBuilder::new("test")
            .task(spec("a", agent.clone()))
            .task(spec("b", agent.clone()))
            .task(spec("c", agent.clone()).depends_on(["b", "a"]))
            .build()
            .unwrap();

        let run = pipeline.run().await.unwrap();
        let c = run.output("c").unwrap();

        let b_pos = c.find("### Output of b").unwrap();
        let a_pos = c.find("### Output of a").unwrap();
        assert!(b_pos < a_pos, "context must follow declaration order");
        assert_eq!(run.final_output(), c);
    }

    #[tokio::test]
    async fn test_seeded_input_feeds_dependents() {
        let agent: Arc<dyn TaskAgent> = Arc::new(EchoAgent);
        let pipeline = PipelineBuilder::new("test")
            .seed("external_data", "ISSUES: 3 bugs")
            .task(spec("detect", agent).depends_on(["external_data"]))
            .build()
            .unwrap();

        let run = pipeline.run().await.unwrap();
        assert!(run.output("detect").unwrap().contains("ISSUES: 3 bugs"));
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_tasks() {
        let echo: Arc<dyn TaskAgent> = Arc::new(EchoAgent);
        let failing: Arc<dyn TaskAgent> = Arc::new(FailingAgent);
        let pipeline = PipelineBuilder::new("test")
            .task(spec("a", echo.clone()))
            .task(spec("b", failing))
            .task(spec("c", echo))
            .build()
            .unwrap();

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, CoreError::TaskFailed { task, .. } if task == "b"));
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_error() {
        struct SlowAgent;

        #[async_trait]
        impl TaskAgent for SlowAgent {
            fn role_name(&self) -> &str {
                "slow"
            }

            async fn execute(
                &self,
                _task: &TaskSpec,
                _context: Option<&str>,
            ) -> CoreResult<String> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(String::new())
            }
        }

        let pipeline = PipelineBuilder::new("slow")
            .task(spec("a", Arc::new(SlowAgent)))
            .timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout { .. }));
    }

    #[test]
    fn test_builder_rejects_forward_dependency() {
        let agent: Arc<dyn TaskAgent> = Arc::new(EchoAgent);
        let err = PipelineBuilder::new("test")
            .task(spec("a", agent.clone()).depends_on(["b"]))
            .task(spec("b", agent))
            .build()
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::ForwardDependency { task, dependency }
                if task == "a" && dependency == "b"
        ));
    }

    #[test]
    fn test_builder_rejects_unknown_dependency() {
        let agent: Arc<dyn TaskAgent> = Arc::new(EchoAgent);
        let err = PipelineBuilder::new("test")
            .task(spec("a", agent).depends_on(["missing"]))
            .build()
            .unwrap_err();

        assert!(matches!(err, CoreError::UnknownDependency { .. }));
    }

    #[test]
    fn test_builder_rejects_duplicates_and_empty() {
        let agent: Arc<dyn TaskAgent> = Arc::new(EchoAgent);
        let err = PipelineBuilder::new("test")
            .task(spec("a", agent.clone()))
            .task(spec("a", agent))
            .build()
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateTask(name) if name == "a"));

        let err = PipelineBuilder::new("empty").build().unwrap_err();
        assert!(matches!(err, CoreError::EmptyPipeline(_)));
    }
}
