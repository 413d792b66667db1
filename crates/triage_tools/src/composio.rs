//! Capability aggregator adapter.
//!
//! Tool handles for the three SaaS products are obtained from a hosted
//! aggregator, scoped by an entity identifier that selects the user's
//! connected accounts. Acquisition failures propagate to the caller;
//! startup is expected to fail loudly when a connection is missing. There
//! is no caching of handle lists and no retry.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use triage_llm::ToolDefinition;

use crate::error::{ToolError, ToolResult};
use crate::tool::{Tool, ToolRegistry};

/// Default aggregator endpoint.
pub const DEFAULT_COMPOSIO_BASE_URL: &str = "https://backend.composio.dev";

/// A capability group: one external SaaS product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum App {
    Github,
    Notion,
    GoogleCalendar,
}

impl App {
    pub fn as_str(&self) -> &'static str {
        match self {
            App::Github => "github",
            App::Notion => "notion",
            App::GoogleCalendar => "googlecalendar",
        }
    }

    /// The curated action subset each flow relies on.
    pub fn curated_actions(&self) -> &'static [&'static str] {
        match self {
            App::Github => &[
                "GITHUB_ISSUES_LIST_FOR_REPO",
                "GITHUB_LIST_PULL_REQUESTS",
            ],
            App::Notion => &[
                "NOTION_SEARCH_NOTION_PAGE",
                "NOTION_CREATE_DATABASE",
                "NOTION_INSERT_ROW_DATABASE",
            ],
            App::GoogleCalendar => &["GOOGLECALENDAR_CREATE_EVENT"],
        }
    }
}

impl std::fmt::Display for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action metadata returned by the aggregator's listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_parameters")]
    pub parameters: Value,
}

fn default_parameters() -> Value {
    serde_json::json!({"type": "object", "properties": {}})
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    items: Vec<ActionSchema>,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    #[serde(default)]
    successful: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<String>,
}

impl ExecuteResponse {
    fn into_result(self, action: &str) -> ToolResult<String> {
        if self.successful {
            Ok(self.data.to_string())
        } else {
            Err(ToolError::ActionFailed {
                action: action.to_string(),
                message: self.error.unwrap_or_else(|| "unknown error".to_string()),
            })
        }
    }
}

/// Client for the aggregator API, scoped to one entity.
#[derive(Clone)]
pub struct ComposioClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    entity_id: String,
}

impl ComposioClient {
    pub fn new(api_key: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_COMPOSIO_BASE_URL.to_string(),
            api_key: api_key.into(),
            entity_id: entity_id.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// List the entity's available actions for one capability group.
    ///
    /// An empty listing means the entity has no active connection for the
    /// app, which is an error: nothing downstream can work without it.
    pub async fn list_actions(&self, app: App) -> ToolResult<Vec<ActionSchema>> {
        let url = format!("{}/api/v2/actions", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(url)
            .header("x-api-key", &self.api_key)
            .query(&[("apps", app.as_str()), ("entityId", &self.entity_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Aggregator {
                status: status.as_u16(),
                body,
            });
        }

        let listing: ListResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Malformed(e.to_string()))?;

        if listing.items.is_empty() {
            return Err(ToolError::NoConnection {
                app: app.to_string(),
                entity: self.entity_id.clone(),
            });
        }

        Ok(listing.items)
    }

    /// Execute one remote action.
    pub async fn execute(&self, action: &str, input: Value) -> ToolResult<String> {
        let url = format!(
            "{}/api/v2/actions/{action}/execute",
            self.base_url.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "entityId": self.entity_id,
            "input": input,
        });

        let response = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Aggregator {
                status: status.as_u16(),
                body,
            });
        }

        let outcome: ExecuteResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Malformed(e.to_string()))?;
        outcome.into_result(action)
    }

    /// Build a registry of the curated tool handles for one capability
    /// group.
    pub async fn toolkit(&self, app: App) -> ToolResult<ToolRegistry> {
        self.toolkit_for_actions(app, app.curated_actions()).await
    }

    /// Build a registry restricted to an explicit list of action names.
    pub async fn toolkit_for_actions(
        &self,
        app: App,
        names: &[&str],
    ) -> ToolResult<ToolRegistry> {
        let actions = self.list_actions(app).await?;

        let mut registry = ToolRegistry::new();
        for schema in actions {
            if !names.contains(&schema.name.as_str()) {
                continue;
            }
            registry.register(Arc::new(RemoteAction {
                client: self.clone(),
                schema,
            }));
        }

        if registry.is_empty() {
            return Err(ToolError::NoConnection {
                app: app.to_string(),
                entity: self.entity_id.clone(),
            });
        }

        info!(app = %app, tools = registry.len(), "capability toolkit ready");
        Ok(registry)
    }
}

impl std::fmt::Debug for ComposioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposioClient")
            .field("base_url", &self.base_url)
            .field("entity_id", &self.entity_id)
            .finish()
    }
}

/// A single aggregator action exposed as a [`Tool`].
pub struct RemoteAction {
    client: ComposioClient,
    schema: ActionSchema,
}

#[async_trait::async_trait]
impl Tool for RemoteAction {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.schema.name.clone(),
            description: self.schema.description.clone(),
            parameters: self.schema.parameters.clone(),
        }
    }

    async fn invoke(&self, args: Value) -> ToolResult<String> {
        self.client.execute(&self.schema.name, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_names() {
        assert_eq!(App::Github.as_str(), "github");
        assert_eq!(App::Notion.as_str(), "notion");
        assert_eq!(App::GoogleCalendar.as_str(), "googlecalendar");
    }

    #[test]
    fn test_curated_actions_cover_every_flow_step() {
        assert!(App::Github
            .curated_actions()
            .contains(&"GITHUB_ISSUES_LIST_FOR_REPO"));
        assert!(App::Notion
            .curated_actions()
            .contains(&"NOTION_INSERT_ROW_DATABASE"));
        assert_eq!(
            App::GoogleCalendar.curated_actions(),
            ["GOOGLECALENDAR_CREATE_EVENT"]
        );
    }

    #[test]
    fn test_execute_response_success() {
        let response: ExecuteResponse = serde_json::from_str(
            r#"{"successful": true, "data": {"issues": [{"number": 1}]}, "error": null}"#,
        )
        .unwrap();
        let text = response.into_result("GITHUB_ISSUES_LIST_FOR_REPO").unwrap();
        assert!(text.contains("\"number\":1"));
    }

    #[test]
    fn test_execute_response_failure() {
        let response: ExecuteResponse =
            serde_json::from_str(r#"{"successful": false, "error": "rate limited"}"#).unwrap();
        let err = response
            .into_result("NOTION_CREATE_DATABASE")
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::ActionFailed { action, message }
                if action == "NOTION_CREATE_DATABASE" && message == "rate limited"
        ));
    }

    #[test]
    fn test_action_schema_defaults() {
        let schema: ActionSchema =
            serde_json::from_str(r#"{"name": "GOOGLECALENDAR_CREATE_EVENT"}"#).unwrap();
        assert_eq!(schema.description, "");
        assert_eq!(schema.parameters["type"], "object");
    }
}
