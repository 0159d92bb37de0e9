//! Base tool definitions.
//!
//! Provides the `Tool` trait every capability implements, the argument
//! schema used to validate calls before they reach a tool, and the
//! failure-safe `ToolResult` shape that tools hand back to agents.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ToolResult
// ---------------------------------------------------------------------------

/// Result object returned by every tool.
///
/// Either the operation's native payload merged with `success: true`, or
/// `success: false` plus an `error` message and any tool-specific empty
/// defaults (for example `anomalies: []`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ToolResult {
    /// Wrap a successful payload.
    ///
    /// Object payloads are merged at the top level; anything else is kept
    /// under `data`. A `success` or `error` key in the payload is dropped in
    /// favour of the explicit fields.
    pub fn success(payload: Value) -> Self {
        let mut payload = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        payload.remove("success");
        payload.remove("error");
        Self {
            success: true,
            error: None,
            payload,
        }
    }

    /// Build a failure result carrying `error` and the given defaults.
    pub fn failure(error: impl Into<String>, defaults: &Map<String, Value>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            payload: defaults.clone(),
        }
    }

    /// Look up a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Serialize into a single JSON object.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

// ---------------------------------------------------------------------------
// Argument schema
// ---------------------------------------------------------------------------

/// JSON type accepted for a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    String,
    Integer,
    Boolean,
}

impl ArgType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// A single argument in a tool's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolArg {
    pub name: String,
    #[serde(rename = "type")]
    pub arg_type: ArgType,
    pub description: String,
    pub required: bool,
    /// Value used when an optional argument is omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ToolArg {
    /// A required argument.
    pub fn required(name: &str, arg_type: ArgType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            arg_type,
            description: description.to_string(),
            required: true,
            default: None,
        }
    }

    /// An optional argument with no default.
    pub fn optional(name: &str, arg_type: ArgType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            arg_type,
            description: description.to_string(),
            required: false,
            default: None,
        }
    }

    /// An optional argument that falls back to `default` when omitted.
    pub fn with_default(name: &str, arg_type: ArgType, description: &str, default: Value) -> Self {
        Self {
            name: name.to_string(),
            arg_type,
            description: description.to_string(),
            required: false,
            default: Some(default),
        }
    }
}

/// Validate `args` against `schema` and fill in defaults.
///
/// Missing (or null) required arguments and arguments of the wrong JSON type
/// are rejected. Arguments not named in the schema are passed through.
pub fn resolve_args(
    tool_name: &str,
    schema: &[ToolArg],
    args: &Map<String, Value>,
) -> Result<Map<String, Value>, ToolError> {
    let mut resolved = args.clone();

    for arg in schema {
        match args.get(&arg.name) {
            Some(Value::Null) | None => {
                resolved.remove(&arg.name);
                if arg.required {
                    return Err(ToolError::Validation {
                        tool: tool_name.to_string(),
                        message: format!("missing required argument '{}'", arg.name),
                    });
                }
                if let Some(default) = &arg.default {
                    resolved.insert(arg.name.clone(), default.clone());
                }
            }
            Some(value) if !arg.arg_type.matches(value) => {
                return Err(ToolError::Validation {
                    tool: tool_name.to_string(),
                    message: format!(
                        "argument '{}' must be of type {:?}",
                        arg.name, arg.arg_type
                    ),
                });
            }
            Some(_) => {}
        }
    }

    Ok(resolved)
}

/// Render an argument list as a JSON Schema object.
pub fn schema_to_json(schema: &[ToolArg]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for arg in schema {
        let mut prop = Map::new();
        prop.insert(
            "type".to_string(),
            serde_json::to_value(arg.arg_type).unwrap_or(Value::Null),
        );
        prop.insert(
            "description".to_string(),
            Value::String(arg.description.clone()),
        );
        if let Some(default) = &arg.default {
            prop.insert("default".to_string(), default.clone());
        }
        properties.insert(arg.name.clone(), Value::Object(prop));
        if arg.required {
            required.push(Value::String(arg.name.clone()));
        }
    }
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

// ---------------------------------------------------------------------------
// ToolError
// ---------------------------------------------------------------------------

/// Errors raised before a tool is reached.
///
/// Transport failures are never reported here; tools fold them into a
/// failed `ToolResult`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {message}")]
    Validation { tool: String, message: String },

    #[error("agent '{agent}' is not permitted to use tool '{tool}'")]
    NotPermitted { agent: String, tool: String },
}

// ---------------------------------------------------------------------------
// Tool trait
// ---------------------------------------------------------------------------

/// A capability an agent may invoke to gather data before replying.
///
/// `call` receives arguments that have already been validated and defaulted
/// against `args_schema`, and must not fail: every error is returned as a
/// `ToolResult` with `success: false`.
#[async_trait]
pub trait Tool: Send + Sync + fmt::Debug {
    /// Unique name of the tool.
    fn name(&self) -> &str;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// Declared arguments.
    fn args_schema(&self) -> &[ToolArg];

    /// Whether repeating the call has no additional side effects.
    fn idempotent(&self) -> bool {
        true
    }

    /// Execute the tool.
    async fn call(&self, args: Map<String, Value>) -> ToolResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Vec<ToolArg> {
        vec![
            ToolArg::required("org_id", ArgType::String, "Organization ID"),
            ToolArg::with_default("horizon", ArgType::Integer, "Horizon in days", json!(7)),
            ToolArg::optional("metric_key", ArgType::String, "Metric key"),
        ]
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_success_merges_object_payload() {
        let result = ToolResult::success(json!({"forecast": [1, 2], "backend": "statistical"}));
        let value = result.to_value();
        assert_eq!(value["success"], true);
        assert_eq!(value["backend"], "statistical");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_success_wraps_scalar_payload() {
        let result = ToolResult::success(json!("plain text"));
        assert_eq!(result.get("data"), Some(&json!("plain text")));
    }

    #[test]
    fn test_success_ignores_payload_success_flag() {
        let result = ToolResult::success(json!({"success": false, "rows": 3}));
        assert!(result.success);
        assert_eq!(result.to_value()["success"], true);
    }

    #[test]
    fn test_failure_keeps_defaults() {
        let defaults = args(json!({"anomalies": []}));
        let value = ToolResult::failure("timed out", &defaults).to_value();
        assert_eq!(value, json!({"success": false, "error": "timed out", "anomalies": []}));
    }

    #[test]
    fn test_resolve_args_fills_defaults() {
        let resolved = resolve_args("get_forecast", &schema(), &args(json!({"org_id": "acme"}))).unwrap();
        assert_eq!(resolved["horizon"], json!(7));
        assert!(!resolved.contains_key("metric_key"));
    }

    #[test]
    fn test_resolve_args_rejects_missing_required() {
        let err = resolve_args("get_forecast", &schema(), &Map::new()).unwrap_err();
        assert!(matches!(err, ToolError::Validation { ref message, .. } if message.contains("org_id")));
    }

    #[test]
    fn test_resolve_args_rejects_null_required() {
        let err = resolve_args("get_forecast", &schema(), &args(json!({"org_id": null}))).unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));
    }

    #[test]
    fn test_resolve_args_rejects_wrong_type() {
        let err = resolve_args(
            "get_forecast",
            &schema(),
            &args(json!({"org_id": "acme", "horizon": "seven"})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("horizon"));
    }

    #[test]
    fn test_schema_to_json_lists_required() {
        let value = schema_to_json(&schema());
        assert_eq!(value["required"], json!(["org_id"]));
        assert_eq!(value["properties"]["horizon"]["default"], json!(7));
    }
}
