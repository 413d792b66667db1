//! OpenAI-compatible chat client.
//!
//! The endpoint is an unreliable external dependency: requests are
//! single-shot with a bounded request timeout, and errors propagate to the
//! call site. The only resilience mechanism in the system is the constant
//! fallback at the two direct call sites in [`crate::analysis`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LlmError, LlmResult};
use crate::types::{ChatRequest, ChatResponse, Message, Role, ToolCall};

/// Completion surface, behind a trait so agents and tests can substitute
/// their own implementation.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> LlmResult<ChatResponse>;

    /// Model identifier, for logs and status dumps.
    fn model(&self) -> &str;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_body(&self, request: &ChatRequest) -> serde_json::Value {
        let messages: Vec<WireMessage> = request.messages.iter().map(WireMessage::from).collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = max_tokens.into();
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = temperature.into();
        }
        if !request.tools.is_empty() {
            let tools: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = tools.into();
            body["tool_choice"] = "auto".into();
        }
        body
    }
}

#[async_trait]
impl ChatProvider for ChatClient {
    async fn complete(&self, request: ChatRequest) -> LlmResult<ChatResponse> {
        let body = self.build_body(&request);
        debug!(model = %self.model, messages = request.messages.len(), "sending completion request");

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(120))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        let choice = wire
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Malformed("response has no choices".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(ToolCall::try_from)
            .collect::<LlmResult<Vec<_>>>()?;

        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Wire format. The OpenAI protocol carries tool-call arguments as an
// embedded JSON string, not an object.

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl From<&Message> for WireMessage {
    fn from(m: &Message) -> Self {
        Self {
            role: match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::Tool => "tool",
            },
            content: m.content.clone(),
            tool_call_id: m.tool_call_id.clone(),
            tool_calls: m
                .tool_calls
                .as_ref()
                .map(|calls| calls.iter().map(WireToolCall::from).collect()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

impl From<&ToolCall> for WireToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: "function".to_string(),
            function: WireFunction {
                name: call.name.clone(),
                arguments: call.arguments.to_string(),
            },
        }
    }
}

impl TryFrom<WireToolCall> for ToolCall {
    type Error = LlmError;

    fn try_from(call: WireToolCall) -> LlmResult<Self> {
        let arguments = serde_json::from_str(&call.function.arguments)
            .map_err(|e| LlmError::Malformed(format!("tool-call arguments: {e}")))?;
        Ok(Self {
            id: call.id,
            name: call.function.name,
            arguments,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolDefinition;

    fn client() -> ChatClient {
        ChatClient::new("https://api.studio.nebius.ai/v1/", "key", "qwen-72b")
    }

    #[test]
    fn test_completions_url_joins_cleanly() {
        assert_eq!(
            client().completions_url(),
            "https://api.studio.nebius.ai/v1/chat/completions"
        );
    }

    #[test]
    fn test_body_includes_tools_only_when_present() {
        let request = ChatRequest::new(vec![Message::user("hi")]);
        let body = client().build_body(&request);
        assert!(body.get("tools").is_none());

        let request = request.with_tools(vec![ToolDefinition {
            name: "GITHUB_ISSUES_LIST_FOR_REPO".to_string(),
            description: "List issues".to_string(),
            parameters: serde_json::json!({"type": "object"}),
        }]);
        let body = client().build_body(&request);
        assert_eq!(body["tools"][0]["function"]["name"], "GITHUB_ISSUES_LIST_FOR_REPO");
        assert_eq!(body["tool_choice"], "auto");
    }

    #[test]
    fn test_tool_call_arguments_round_trip_as_string() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "NOTION_CREATE_DATABASE".to_string(),
            arguments: serde_json::json!({"title": "GitHub Issues & PRs"}),
        };

        let wire = WireToolCall::from(&call);
        assert_eq!(wire.function.arguments, r#"{"title":"GitHub Issues & PRs"}"#);

        let back = ToolCall::try_from(wire).unwrap();
        assert_eq!(back.arguments["title"], "GitHub Issues & PRs");
    }

    #[test]
    fn test_malformed_arguments_are_rejected() {
        let wire = WireToolCall {
            id: "call_1".to_string(),
            kind: "function".to_string(),
            function: WireFunction {
                name: "x".to_string(),
                arguments: "not json".to_string(),
            },
        };
        assert!(matches!(
            ToolCall::try_from(wire),
            Err(LlmError::Malformed(_))
        ));
    }
}
