//! IntentVision platform tools.
//!
//! Every tool here wraps one endpoint of the IntentVision HTTP API. Each
//! endpoint is described declaratively (method, path template, arguments,
//! timeout, failure defaults) and executed by the shared `EndpointTool`.
//!
//! ## Configuration
//!
//! - `INTENTVISION_API_URL` - base URL of the platform API
//! - `INTENTVISION_API_KEY` - sent as the `X-API-Key` header

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::base_tool::{ArgType, Tool, ToolArg, ToolResult};

/// Default timeout for read endpoints.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for pipeline runs, which take longer to acknowledge.
pub const PIPELINE_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Platform client
// ---------------------------------------------------------------------------

/// Shared HTTP client for the IntentVision API.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl PlatformClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join percent-encoded path segments onto the base URL.
    fn url(&self, segments: &[String]) -> Result<reqwest::Url, EndpointError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| EndpointError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| EndpointError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Errors from a single endpoint call. Never leaves this module: they are
/// folded into a failed `ToolResult`.
#[derive(Debug, Error)]
enum EndpointError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("missing path argument '{0}'")]
    MissingPathArg(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(reqwest::Error),
}

// ---------------------------------------------------------------------------
// Endpoint description
// ---------------------------------------------------------------------------

/// HTTP method used by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One segment of an endpoint path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(&'static str),
    /// Substituted from the named argument.
    Arg(&'static str),
}

/// A tool backed by one platform endpoint.
///
/// Arguments that do not appear in the path are sent as query parameters for
/// GET and as a JSON body for POST.
#[derive(Debug, Clone)]
pub struct EndpointTool {
    name: String,
    description: String,
    method: HttpMethod,
    path: Vec<Segment>,
    args: Vec<ToolArg>,
    timeout: Duration,
    failure_defaults: Map<String, Value>,
    client: Arc<PlatformClient>,
}

impl EndpointTool {
    pub fn new(
        name: &str,
        description: &str,
        method: HttpMethod,
        path: Vec<Segment>,
        args: Vec<ToolArg>,
        client: Arc<PlatformClient>,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            method,
            path,
            args,
            timeout: DEFAULT_TOOL_TIMEOUT,
            failure_defaults: Map::new(),
            client,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fields added to the failure payload, e.g. `{"anomalies": []}`.
    pub fn with_failure_defaults(mut self, defaults: Value) -> Self {
        if let Value::Object(map) = defaults {
            self.failure_defaults = map;
        }
        self
    }

    fn path_arg_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.path.iter().filter_map(|s| match s {
            Segment::Arg(name) => Some(*name),
            Segment::Literal(_) => None,
        })
    }

    async fn fetch(&self, args: &Map<String, Value>) -> Result<Value, EndpointError> {
        let mut segments = Vec::with_capacity(self.path.len());
        for segment in &self.path {
            match segment {
                Segment::Literal(lit) => segments.push((*lit).to_string()),
                Segment::Arg(name) => {
                    let value = args
                        .get(*name)
                        .map(value_to_param)
                        .ok_or_else(|| EndpointError::MissingPathArg(name.to_string()))?;
                    segments.push(value);
                }
            }
        }
        let url = self.client.url(&segments)?;

        let path_args: Vec<&str> = self.path_arg_names().collect();
        let rest: Map<String, Value> = args
            .iter()
            .filter(|(k, _)| !path_args.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let request = match self.method {
            HttpMethod::Get => {
                let query: Vec<(String, String)> = rest
                    .iter()
                    .map(|(k, v)| (k.clone(), value_to_param(v)))
                    .collect();
                self.client.http.get(url).query(&query)
            }
            HttpMethod::Post => self.client.http.post(url).json(&Value::Object(rest)),
        };

        let response = request
            .header("X-API-Key", self.client.api_key.as_str())
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EndpointError::Timeout(self.timeout)
                } else {
                    EndpointError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EndpointError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                EndpointError::Timeout(self.timeout)
            } else {
                EndpointError::Decode(e)
            }
        })
    }
}

fn value_to_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Tool for EndpointTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn args_schema(&self) -> &[ToolArg] {
        &self.args
    }

    fn idempotent(&self) -> bool {
        self.method == HttpMethod::Get
    }

    async fn call(&self, args: Map<String, Value>) -> ToolResult {
        match self.fetch(&args).await {
            Ok(payload) => ToolResult::success(payload),
            Err(e) => {
                log::warn!("Tool {} failed against {}: {}", self.name, self.client.base_url(), e);
                ToolResult::failure(e.to_string(), &self.failure_defaults)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Forecast / anomaly / metric tools
// ---------------------------------------------------------------------------

pub fn get_forecast_tool(client: Arc<PlatformClient>) -> EndpointTool {
    EndpointTool::new(
        "get_forecast",
        "Get forecast predictions for a metric from IntentVision",
        HttpMethod::Get,
        vec![
            Segment::Literal("v1"),
            Segment::Literal("forecast"),
            Segment::Arg("org_id"),
            Segment::Arg("metric_key"),
        ],
        vec![
            ToolArg::required("org_id", ArgType::String, "Organization ID"),
            ToolArg::required("metric_key", ArgType::String, "Metric key to forecast"),
            ToolArg::with_default("horizon", ArgType::Integer, "Forecast horizon in days", json!(7)),
            ToolArg::with_default(
                "backend",
                ArgType::String,
                "Forecast backend (\"statistical\" or \"timegpt\")",
                json!("statistical"),
            ),
        ],
        client,
    )
}

pub fn get_anomalies_tool(client: Arc<PlatformClient>) -> EndpointTool {
    EndpointTool::new(
        "get_anomalies",
        "Get detected anomalies for an organization or specific metric",
        HttpMethod::Get,
        vec![
            Segment::Literal("v1"),
            Segment::Literal("anomalies"),
            Segment::Arg("org_id"),
        ],
        vec![
            ToolArg::required("org_id", ArgType::String, "Organization ID"),
            ToolArg::optional("metric_key", ArgType::String, "Optional specific metric key"),
            ToolArg::with_default("time_range", ArgType::String, "Time range, e.g. 1h, 7d, 30d", json!("7d")),
            ToolArg::with_default(
                "min_severity",
                ArgType::String,
                "Minimum severity: info, warning, error, critical",
                json!("warning"),
            ),
        ],
        client,
    )
    .with_failure_defaults(json!({"anomalies": []}))
}

pub fn get_metric_history_tool(client: Arc<PlatformClient>) -> EndpointTool {
    EndpointTool::new(
        "get_metric_history",
        "Get historical values for a metric over a time range",
        HttpMethod::Get,
        vec![
            Segment::Literal("v1"),
            Segment::Literal("metrics"),
            Segment::Arg("org_id"),
            Segment::Arg("metric_key"),
            Segment::Literal("history"),
        ],
        vec![
            ToolArg::required("org_id", ArgType::String, "Organization ID"),
            ToolArg::required("metric_key", ArgType::String, "Metric key to query"),
            ToolArg::with_default("time_range", ArgType::String, "Time range, e.g. 1h, 7d, 30d", json!("7d")),
        ],
        client,
    )
    .with_failure_defaults(json!({"values": []}))
}

// ---------------------------------------------------------------------------
// Alert tools
// ---------------------------------------------------------------------------

pub fn get_alert_rules_tool(client: Arc<PlatformClient>) -> EndpointTool {
    EndpointTool::new(
        "get_alert_rules",
        "Get configured alert rules for an organization",
        HttpMethod::Get,
        vec![
            Segment::Literal("v1"),
            Segment::Literal("alerts"),
            Segment::Arg("org_id"),
            Segment::Literal("rules"),
        ],
        vec![ToolArg::required("org_id", ArgType::String, "Organization ID")],
        client,
    )
    .with_failure_defaults(json!({"rules": []}))
}

pub fn get_alert_history_tool(client: Arc<PlatformClient>) -> EndpointTool {
    EndpointTool::new(
        "get_alert_history",
        "Get alert firing history for an organization",
        HttpMethod::Get,
        vec![
            Segment::Literal("v1"),
            Segment::Literal("alerts"),
            Segment::Arg("org_id"),
            Segment::Literal("history"),
        ],
        vec![
            ToolArg::required("org_id", ArgType::String, "Organization ID"),
            ToolArg::optional("rule_id", ArgType::String, "Optional specific rule ID"),
            ToolArg::with_default("time_range", ArgType::String, "Time range to query", json!("30d")),
        ],
        client,
    )
    .with_failure_defaults(json!({"events": []}))
}

// ---------------------------------------------------------------------------
// Pipeline tools
// ---------------------------------------------------------------------------

pub fn run_pipeline_tool(client: Arc<PlatformClient>) -> EndpointTool {
    EndpointTool::new(
        "run_pipeline",
        "Trigger an IntentVision pipeline run for an organization",
        HttpMethod::Post,
        vec![
            Segment::Literal("v1"),
            Segment::Literal("pipeline"),
            Segment::Arg("org_id"),
            Segment::Literal("run"),
        ],
        vec![
            ToolArg::required("org_id", ArgType::String, "Organization ID"),
            ToolArg::with_default("use_synthetic", ArgType::Boolean, "Whether to use synthetic data", json!(true)),
        ],
        client,
    )
    .with_timeout(PIPELINE_TOOL_TIMEOUT)
}
