//! Wire types of the gateway's A2A surface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::agents::{AgentIdentity, Skill};

/// A2A protocol version published on every card.
pub const PROTOCOL_VERSION: &str = "0.3.0";

// ---------------------------------------------------------------------------
// Agent card
// ---------------------------------------------------------------------------

/// A skill as published on an agent card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSkill {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_object")]
    pub input_schema: Value,
    #[serde(default = "empty_object")]
    pub output_schema: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl From<&Skill> for AgentSkill {
    fn from(skill: &Skill) -> Self {
        Self {
            name: skill.name.clone(),
            description: skill.description.clone(),
            input_schema: match &skill.input_schema {
                Value::Null => empty_object(),
                schema => schema.clone(),
            },
            output_schema: skill.output_schema.clone().unwrap_or_else(empty_object),
        }
    }
}

/// Self-describing metadata document for an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCard {
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    pub name: String,
    pub version: String,
    pub url: String,
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
    #[serde(default)]
    pub spiffe_id: Option<String>,
}

fn default_protocol_version() -> String {
    PROTOCOL_VERSION.to_string()
}

impl From<&AgentIdentity> for AgentCard {
    fn from(identity: &AgentIdentity) -> Self {
        Self {
            protocol_version: default_protocol_version(),
            name: identity.card_name.clone(),
            version: identity.version.clone(),
            url: identity.url.clone(),
            description: identity.description.clone(),
            capabilities: identity.capabilities.clone(),
            skills: identity.skills.iter().map(AgentSkill::from).collect(),
            spiffe_id: Some(identity.spiffe_id.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Body of `POST /agents/{name}/tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub skill: String,
    pub input: Value,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub trace_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Task status returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub status: TaskState,
    /// RFC 3339, UTC.
    pub created_at: String,
    pub updated_at: String,
    pub result: Option<Value>,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Body of `POST /agents/orchestrator/chat`. Fields are checked by the
/// gateway so that a missing field yields a descriptive 400.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub trace_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Advisory availability of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentAvailability {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayHealth {
    pub status: String,
    pub gateway_id: String,
    pub spiffe_id: String,
    pub timestamp: String,
    pub agents: BTreeMap<String, AgentAvailability>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentName;
    use crate::config::Deployment;
    use serde_json::json;

    #[test]
    fn test_card_from_identity() {
        let identity = AgentIdentity::new(AgentName::OnboardingCoach, &Deployment::default(), "m");
        let card = serde_json::to_value(AgentCard::from(&identity)).unwrap();

        assert_eq!(card["protocol_version"], "0.3.0");
        assert_eq!(card["name"], "onboarding-coach");
        assert_eq!(card["version"], "0.14.1");
        assert_eq!(card["skills"][0]["name"], "Guide Connection");
        assert_eq!(
            card["skills"][0]["input_schema"],
            json!({"type": "object", "required": ["org_id", "source_type"]})
        );
        assert_eq!(card["skills"][0]["output_schema"], json!({}));
        assert_eq!(
            card["spiffe_id"],
            "spiffe://intent-solutions.io/agent/onboarding-coach/dev/us-central1/0.14.1"
        );
    }

    #[test]
    fn test_task_request_optional_fields() {
        let request: TaskRequest =
            serde_json::from_value(json!({"skill": "Analyze Alerts", "input": {"org_id": "acme"}}))
                .unwrap();
        assert_eq!(request.session_id, None);
        assert_eq!(request.trace_id, None);
    }

    #[test]
    fn test_task_status_serializes_nulls() {
        let status = TaskStatus {
            task_id: "task-alert-tuner-1".to_string(),
            status: TaskState::Failed,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            result: None,
            error: Some("timeout".to_string()),
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["status"], "failed");
        assert!(value["result"].is_null());
    }
}
