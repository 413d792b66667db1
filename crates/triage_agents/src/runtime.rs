//! Agent runtime: the bounded tool-calling loop.
//!
//! One task execution is a conversation: persona, instruction plus
//! upstream context, then alternating model turns and tool results until
//! the model answers with plain text. The loop is bounded both by a round
//! budget and by the profile's wall-clock timeout.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use triage_core::{CoreError, CoreResult, TaskAgent, TaskSpec};
use triage_llm::{ChatRequest, Message};

use crate::error::{AgentError, AgentResult};
use crate::role::AgentProfile;

/// [`TaskAgent`] implementation backed by an [`AgentProfile`].
pub struct AgentRuntime {
    profile: AgentProfile,
}

impl AgentRuntime {
    pub fn new(profile: AgentProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn task_prompt(task: &TaskSpec, context: Option<&str>) -> String {
        let mut prompt = task.instruction.clone();
        if let Some(ctx) = context {
            prompt.push_str("\n\nContext from earlier steps:\n");
            prompt.push_str(ctx);
        }
        prompt.push_str("\n\nExpected output:\n");
        prompt.push_str(&task.expected_output);
        prompt
    }

    async fn run_task(&self, task: &TaskSpec, context: Option<&str>) -> AgentResult<String> {
        let mut messages = vec![
            Message::system(self.profile.persona()),
            Message::user(Self::task_prompt(task, context)),
        ];
        let tools = self.profile.tools.definitions();

        for round in 0..self.profile.max_tool_rounds {
            debug!(agent = %self.profile.role, task = %task.name, round, "model turn");

            let request = ChatRequest::new(messages.clone())
                .with_tools(tools.clone())
                .with_temperature(0.3);
            let response = self.profile.llm.complete(request).await?;

            if response.is_final() {
                info!(agent = %self.profile.role, task = %task.name, round, "task answered");
                return Ok(response.content);
            }

            let mut assistant = Message::assistant(response.content.clone());
            assistant.tool_calls = Some(response.tool_calls.clone());
            messages.push(assistant);

            for call in &response.tool_calls {
                let result = match self.profile.tools.invoke(call).await {
                    Ok(output) => output,
                    // Tool failures go back to the model as text; it may
                    // recover or report them in its answer.
                    Err(e) => {
                        warn!(agent = %self.profile.role, tool = %call.name, error = %e, "tool failed");
                        format!("Error: {e}")
                    }
                };
                messages.push(Message::tool_result(&call.id, result));
            }
        }

        Err(AgentError::ToolBudgetExhausted(self.profile.max_tool_rounds))
    }
}

#[async_trait]
impl TaskAgent for AgentRuntime {
    fn role_name(&self) -> &str {
        self.profile.role.as_str()
    }

    async fn execute(&self, task: &TaskSpec, context: Option<&str>) -> CoreResult<String> {
        let timeout = self.profile.timeout;
        let outcome = tokio::time::timeout(timeout, self.run_task(task, context))
            .await
            .unwrap_or_else(|_| {
                Err(AgentError::Timeout {
                    agent: self.profile.role.to_string(),
                    seconds: timeout.as_secs(),
                })
            });

        outcome.map_err(|e| CoreError::TaskFailed {
            task: task.name.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::role::AgentRole;
    use triage_llm::{ChatProvider, ChatResponse, LlmResult, ToolCall, ToolDefinition};
    use triage_tools::{Tool, ToolRegistry, ToolResult};

    /// Provider that replays a scripted sequence of responses.
    struct ScriptedProvider {
        responses: Mutex<Vec<ChatResponse>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<ChatResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn complete(&self, _request: ChatRequest) -> LlmResult<ChatResponse> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(ChatResponse {
                    content: "done".to_string(),
                    tool_calls: Vec::new(),
                })
            } else {
                Ok(responses.remove(0))
            }
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    struct CountingTool {
        calls: Arc<Mutex<u32>>,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "GITHUB_ISSUES_LIST_FOR_REPO".to_string(),
                description: "List issues".to_string(),
                parameters: serde_json::json!({"type": "object"}),
            }
        }

        async fn invoke(&self, _args: serde_json::Value) -> ToolResult<String> {
            *self.calls.lock().unwrap() += 1;
            Ok(r#"{"issues": []}"#.to_string())
        }
    }

    fn tool_call() -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: "GITHUB_ISSUES_LIST_FOR_REPO".to_string(),
            arguments: serde_json::json!({"repo": "vercel/next-learn"}),
        }
    }

    fn task(agent: Arc<dyn TaskAgent>) -> TaskSpec {
        TaskSpec::new("fetch_issues", "Fetch issues", "A report", agent)
    }

    #[tokio::test]
    async fn test_runtime_runs_tools_then_returns_final_text() {
        let calls = Arc::new(Mutex::new(0));
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(CountingTool {
            calls: calls.clone(),
        }));

        let llm = Arc::new(ScriptedProvider::new(vec![
            ChatResponse {
                content: String::new(),
                tool_calls: vec![tool_call()],
            },
            ChatResponse {
                content: "3 issues found".to_string(),
                tool_calls: Vec::new(),
            },
        ]));

        let runtime: Arc<dyn TaskAgent> =
            Arc::new(AgentRuntime::new(AgentProfile::new(AgentRole::Github, tools, llm)));

        let output = runtime
            .execute(&task(runtime.clone()), Some("### Output of seed\nhello\n"))
            .await
            .unwrap();

        assert_eq!(output, "3 issues found");
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_runtime_exhausts_tool_budget() {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(CountingTool {
            calls: Arc::new(Mutex::new(0)),
        }));

        // Model asks for a tool on every turn, forever.
        let endless: Vec<ChatResponse> = (0..16)
            .map(|_| ChatResponse {
                content: String::new(),
                tool_calls: vec![tool_call()],
            })
            .collect();

        let mut profile = AgentProfile::new(
            AgentRole::Github,
            tools,
            Arc::new(ScriptedProvider::new(endless)),
        );
        profile.max_tool_rounds = 3;
        let runtime: Arc<dyn TaskAgent> = Arc::new(AgentRuntime::new(profile));

        let err = runtime.execute(&task(runtime.clone()), None).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::TaskFailed { message, .. } if message.contains("3 rounds")
        ));
    }

    #[tokio::test]
    async fn test_runtime_reports_unknown_tool_back_to_model() {
        // Registry is empty, so the call fails; the model then answers.
        let llm = Arc::new(ScriptedProvider::new(vec![
            ChatResponse {
                content: String::new(),
                tool_calls: vec![tool_call()],
            },
            ChatResponse {
                content: "could not fetch".to_string(),
                tool_calls: Vec::new(),
            },
        ]));

        let runtime: Arc<dyn TaskAgent> = Arc::new(AgentRuntime::new(AgentProfile::new(
            AgentRole::Github,
            ToolRegistry::new(),
            llm,
        )));

        let output = runtime.execute(&task(runtime.clone()), None).await.unwrap();
        assert_eq!(output, "could not fetch");
    }

    #[test]
    fn test_task_prompt_layout() {
        struct Noop;

        #[async_trait]
        impl TaskAgent for Noop {
            fn role_name(&self) -> &str {
                "noop"
            }
            async fn execute(&self, _t: &TaskSpec, _c: Option<&str>) -> CoreResult<String> {
                Ok(String::new())
            }
        }

        let spec = TaskSpec::new("analyze", "Analyze the data", "A report", Arc::new(Noop));
        let prompt = AgentRuntime::task_prompt(&spec, Some("### Output of fetch\nrows\n"));

        let instruction_pos = prompt.find("Analyze the data").unwrap();
        let context_pos = prompt.find("Context from earlier steps:").unwrap();
        let expected_pos = prompt.find("Expected output:").unwrap();
        assert!(instruction_pos < context_pos && context_pos < expected_pos);
    }
}
