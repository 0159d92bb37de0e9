//! Tool registry: resolves a tool name to an invocable tool.
//!
//! The registry is assembled once at startup and is read-only afterwards,
//! so it is shared between agents behind an `Arc` without locking.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::base_tool::{resolve_args, schema_to_json, Tool, ToolError, ToolResult};
use super::common::{ListConnectorsTool, WebSearchTool};
use super::intentvision_api::{
    get_alert_history_tool, get_alert_rules_tool, get_anomalies_tool, get_forecast_tool,
    get_metric_history_tool, run_pipeline_tool, PlatformClient,
};

/// Registry of every tool known to the process.
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, used for stable listings.
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every IntentVision tool bound to `client`.
    pub fn with_platform(client: Arc<PlatformClient>, search_endpoint: Option<String>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(get_forecast_tool(client.clone())));
        registry.register(Arc::new(get_anomalies_tool(client.clone())));
        registry.register(Arc::new(get_metric_history_tool(client.clone())));
        registry.register(Arc::new(get_alert_rules_tool(client.clone())));
        registry.register(Arc::new(get_alert_history_tool(client.clone())));
        registry.register(Arc::new(run_pipeline_tool(client)));
        registry.register(Arc::new(ListConnectorsTool));
        registry.register(Arc::new(WebSearchTool::new(search_endpoint)));
        registry
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            log::warn!("Tool '{}' registered twice; keeping the latest", name);
        } else {
            self.order.push(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Tool names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Function declaration for `name` in the shape LLM providers expect.
    pub fn declaration(&self, name: &str) -> Option<Value> {
        self.tools.get(name).map(|tool| {
            serde_json::json!({
                "name": tool.name(),
                "description": tool.description(),
                "parameters": schema_to_json(tool.args_schema()),
            })
        })
    }

    /// Validate `args` and invoke the named tool.
    pub async fn invoke(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let args = resolve_args(name, tool.args_schema(), args)?;
        log::debug!("Invoking tool {}", name);
        Ok(tool.call(args).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        let client = Arc::new(PlatformClient::new("http://127.0.0.1:9", "test"));
        ToolRegistry::with_platform(client, None)
    }

    #[test]
    fn test_registry_lists_all_tools_in_order() {
        assert_eq!(
            registry().names(),
            &[
                "get_forecast",
                "get_anomalies",
                "get_metric_history",
                "get_alert_rules",
                "get_alert_history",
                "run_pipeline",
                "list_connectors",
                "google_search",
            ]
        );
    }

    #[test]
    fn test_declaration_includes_parameters() {
        let decl = registry().declaration("get_alert_history").unwrap();
        assert_eq!(decl["parameters"]["required"], json!(["org_id"]));
        assert_eq!(decl["parameters"]["properties"]["time_range"]["default"], json!("30d"));
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let err = registry().invoke("delete_everything", &Map::new()).await.unwrap_err();
        assert_eq!(err, ToolError::UnknownTool("delete_everything".to_string()));
    }

    #[tokio::test]
    async fn test_invoke_missing_required_argument() {
        let args = json!({"metric_key": "revenue.daily"});
        let err = registry()
            .invoke("get_forecast", args.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation { ref tool, .. } if tool == "get_forecast"));
    }

    #[tokio::test]
    async fn test_invoke_transport_failure_is_not_an_error() {
        let args = json!({"org_id": "acme"});
        let result = registry()
            .invoke("get_alert_rules", args.as_object().unwrap())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.get("rules"), Some(&json!([])));
    }

    #[tokio::test]
    async fn test_invoke_static_tool() {
        let result = registry().invoke("list_connectors", &Map::new()).await.unwrap();
        assert!(result.success);
    }
}
