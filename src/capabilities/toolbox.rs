//! Profile-scoped access to the tool registry.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::agents::AgentName;
use crate::tools::{ToolError, ToolRegistry, ToolResult};

/// The only handle an agent runtime gets on tools.
///
/// Calls for tools outside the agent's profile are rejected with
/// `ToolError::NotPermitted` before the registry is consulted.
#[derive(Debug, Clone)]
pub struct ScopedToolbox {
    agent: AgentName,
    allowed: Vec<String>,
    registry: Arc<ToolRegistry>,
}

impl ScopedToolbox {
    pub fn new(agent: AgentName, allowed: Vec<String>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            agent,
            allowed,
            registry,
        }
    }

    pub fn agent(&self) -> AgentName {
        self.agent
    }

    pub fn tool_names(&self) -> &[String] {
        &self.allowed
    }

    pub fn permits(&self, tool: &str) -> bool {
        self.allowed.iter().any(|t| t == tool)
    }

    /// Function declarations for every permitted tool, in profile order.
    pub fn declarations(&self) -> Vec<Value> {
        self.allowed
            .iter()
            .filter_map(|name| self.registry.declaration(name))
            .collect()
    }

    pub async fn invoke(
        &self,
        tool: &str,
        args: &Map<String, Value>,
    ) -> Result<ToolResult, ToolError> {
        if !self.permits(tool) {
            log::warn!(
                "Agent {} attempted to invoke tool '{}' outside its profile",
                self.agent,
                tool
            );
            return Err(ToolError::NotPermitted {
                agent: self.agent.to_string(),
                tool: tool.to_string(),
            });
        }
        self.registry.invoke(tool, args).await
    }
}
