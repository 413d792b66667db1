//! Tool trait and registry.
//!
//! A tool is anything the model may call by name with a JSON arguments
//! object. The registry holds the handles an agent advertises for one
//! capability group and dispatches the model's tool calls.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use triage_llm::{ToolCall, ToolDefinition};

use crate::error::{ToolError, ToolResult};

/// An invocable tool handle.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Definition advertised to the model (name, description, JSON Schema).
    fn definition(&self) -> ToolDefinition;

    /// Execute with the given arguments, returning a text blob.
    async fn invoke(&self, args: Value) -> ToolResult<String>;
}

/// Named collection of tool handles.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its definition name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        debug!(%name, "registering tool");
        self.tools.insert(name, tool);
    }

    /// All definitions, for advertising to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Dispatch one model-requested call.
    pub async fn invoke(&self, call: &ToolCall) -> ToolResult<String> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        debug!(name = %call.name, "invoking tool");
        tool.invoke(call.arguments.clone()).await
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}
