//! Tools shared across several agents that are not platform endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::base_tool::{ArgType, Tool, ToolArg, ToolResult};

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// google_search
// ---------------------------------------------------------------------------

/// Web search for domain knowledge (forecasting, anomaly detection, ...).
///
/// Queries a SearXNG-compatible JSON endpoint when one is configured
/// (`SEARCH_API_URL`). Without an endpoint the tool still succeeds and tells
/// the model that no results are available.
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    endpoint: Option<String>,
    args: Vec<ToolArg>,
    http: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
            args: vec![
                ToolArg::required("query", ArgType::String, "Search query string"),
                ToolArg::with_default(
                    "num_results",
                    ArgType::Integer,
                    "Maximum number of results to return",
                    json!(5),
                ),
            ],
            http: reqwest::Client::new(),
        }
    }

    async fn search(&self, endpoint: &str, query: &str, limit: usize) -> Result<Vec<Value>, String> {
        let url = format!("{}/search", endpoint.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(&[("q", query), ("format", "json")])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        let body: Value = response.json().await.map_err(|e| e.to_string())?;
        let results = body
            .get("results")
            .and_then(|r| r.as_array())
            .ok_or_else(|| "search response has no results array".to_string())?;

        Ok(results
            .iter()
            .take(limit)
            .map(|r| {
                json!({
                    "title": r.get("title").and_then(|t| t.as_str()).unwrap_or(""),
                    "url": r.get("url").and_then(|u| u.as_str()).unwrap_or(""),
                    "snippet": r.get("content").and_then(|c| c.as_str()).unwrap_or(""),
                })
            })
            .collect())
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "google_search"
    }

    fn description(&self) -> &str {
        "Search the web for information about metrics, forecasting, anomaly detection, and related topics"
    }

    fn args_schema(&self) -> &[ToolArg] {
        &self.args
    }

    async fn call(&self, args: Map<String, Value>) -> ToolResult {
        let query = args.get("query").and_then(|q| q.as_str()).unwrap_or_default();
        let limit = args
            .get("num_results")
            .and_then(|n| n.as_u64())
            .unwrap_or(5) as usize;

        let Some(endpoint) = self.endpoint.as_deref() else {
            return ToolResult::success(json!({
                "query": query,
                "source": "none",
                "results": [],
                "message": format!("[Search results for '{}' - {} results]", query, limit),
            }));
        };

        match self.search(endpoint, query, limit).await {
            Ok(results) => ToolResult::success(json!({
                "query": query,
                "source": "searxng",
                "results": results,
            })),
            Err(e) => {
                log::warn!("Search for '{}' failed: {}", query, e);
                let mut defaults = Map::new();
                defaults.insert("results".to_string(), json!([]));
                ToolResult::failure(e, &defaults)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// list_connectors
// ---------------------------------------------------------------------------

/// Static catalogue of supported ingestion connectors.
#[derive(Debug, Clone, Default)]
pub struct ListConnectorsTool;

impl ListConnectorsTool {
    pub fn catalogue() -> Value {
        json!([
            {
                "type": "stripe",
                "name": "Stripe",
                "description": "Connect to Stripe for revenue metrics",
                "config_schema": {
                    "api_key": {"type": "string", "required": true},
                    "metrics": {"type": "array", "items": ["mrr", "arr", "churn"]}
                }
            },
            {
                "type": "posthog",
                "name": "PostHog",
                "description": "Connect to PostHog for product analytics",
                "config_schema": {
                    "api_key": {"type": "string", "required": true},
                    "project_id": {"type": "string", "required": true}
                }
            },
            {
                "type": "webhook",
                "name": "Webhook",
                "description": "Receive metrics via HTTP webhook",
                "config_schema": {
                    "endpoint": {"type": "string", "auto_generated": true}
                }
            },
            {
                "type": "csv",
                "name": "CSV Upload",
                "description": "Upload historical data via CSV",
                "config_schema": {
                    "format": {"type": "string", "enum": ["time_value", "pivot"]}
                }
            }
        ])
    }
}

#[async_trait]
impl Tool for ListConnectorsTool {
    fn name(&self) -> &str {
        "list_connectors"
    }

    fn description(&self) -> &str {
        "List available data connectors for metric ingestion"
    }

    fn args_schema(&self) -> &[ToolArg] {
        &[]
    }

    async fn call(&self, _args: Map<String, Value>) -> ToolResult {
        ToolResult::success(json!({ "connectors": Self::catalogue() }))
    }
}
