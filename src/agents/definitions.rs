//! Agent identities: the immutable description of each agent.
//!
//! An identity carries everything the gateway publishes on the agent card
//! plus what the runtime needs to bind the agent (model, instruction text).
//! Identities are created once at bootstrap and never mutated.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::instructions::instruction_for;
use super::AgentName;
use crate::config::Deployment;

/// Version published on every agent card.
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Public base URL for agent cards.
pub const AGENT_BASE_URL: &str = "https://agents.intentvision.intent-solutions.io";

const SPIFFE_TRUST_DOMAIN: &str = "spiffe://intent-solutions.io";

/// A skill an agent advertises on its card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub description: String,
    /// `{"type": "object", "required": [...]}`.
    #[serde(default)]
    pub input_schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

impl Skill {
    pub fn new(name: &str, description: &str, required: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: json!({"type": "object", "required": required}),
            output_schema: None,
        }
    }

    /// Required input fields declared by the schema.
    pub fn required_fields(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|fields| fields.iter().filter_map(|f| f.as_str()).collect())
            .unwrap_or_default()
    }

    /// Check `input` against the declared input schema.
    ///
    /// Input must be a JSON object with every required field present and
    /// non-null. Returns a message naming the first violation.
    pub fn validate_input(&self, input: &Value) -> Result<(), String> {
        let Some(object) = input.as_object() else {
            return Err(format!("input for skill '{}' must be a JSON object", self.name));
        };
        for field in self.required_fields() {
            match object.get(field) {
                None | Some(Value::Null) => {
                    return Err(format!(
                        "skill '{}' requires input field '{}'",
                        self.name, field
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Immutable description of one deployed agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentIdentity {
    pub name: AgentName,
    pub card_name: String,
    pub version: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub skills: Vec<Skill>,
    /// Agent-engine id used to address the deployed agent.
    pub engine_id: String,
    pub url: String,
    pub spiffe_id: String,
    pub model: String,
    pub instruction: String,
}

impl AgentIdentity {
    /// Build the identity of `name` for a deployment.
    pub fn new(name: AgentName, deployment: &Deployment, model: &str) -> Self {
        let card_name = name.card_name().to_string();
        let spiffe_id = format!(
            "{}/agent/{}/{}/{}/{}",
            SPIFFE_TRUST_DOMAIN, card_name, deployment.env, deployment.location, AGENT_VERSION
        );
        let (description, capabilities, skills) = card_contents(name);

        Self {
            name,
            instruction: instruction_for(name, &spiffe_id, AGENT_VERSION),
            card_name,
            version: AGENT_VERSION.to_string(),
            description: description.to_string(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            skills,
            engine_id: format!("intentvision-{}-{}", name.as_str(), deployment.env),
            url: format!("{}/{}", AGENT_BASE_URL, name.as_str()),
            spiffe_id,
            model: model.to_string(),
        }
    }

    pub fn skill(&self, name: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.name == name)
    }

    /// First skill name declared twice, if any.
    pub fn duplicate_skill(&self) -> Option<&str> {
        self.skills.iter().enumerate().find_map(|(i, skill)| {
            self.skills[..i]
                .iter()
                .any(|earlier| earlier.name == skill.name)
                .then_some(skill.name.as_str())
        })
    }
}

/// SPIFFE id of the gateway itself.
pub fn gateway_spiffe_id(deployment: &Deployment) -> String {
    format!(
        "{}/gateway/a2a/{}/{}",
        SPIFFE_TRUST_DOMAIN, deployment.env, deployment.location
    )
}

fn card_contents(name: AgentName) -> (&'static str, Vec<&'static str>, Vec<Skill>) {
    match name {
        AgentName::Orchestrator => (
            "IntentVision Orchestrator - Routes requests to specialists",
            vec!["routing", "coordination", "forecast_explanation"],
            vec![
                Skill::new(
                    "Explain Forecast",
                    "Explain forecast predictions for a metric",
                    &["org_id", "metric_key"],
                ),
                Skill::new(
                    "Analyze Alerts",
                    "Analyze alert rules and recommend changes",
                    &["org_id"],
                ),
            ],
        ),
        AgentName::MetricAnalyst => (
            "IntentVision Metric Analyst - Forecast and anomaly analysis",
            vec!["forecast_explanation", "anomaly_analysis", "backend_comparison"],
            vec![Skill::new(
                "Explain Forecast",
                "Provide detailed explanation of forecast predictions",
                &["org_id", "metric_key"],
            )],
        ),
        AgentName::AlertTuner => (
            "IntentVision Alert Tuner - Alert optimization",
            vec!["alert_analysis", "threshold_optimization", "noise_reduction"],
            vec![Skill::new(
                "Analyze Alerts",
                "Analyze alert rules and firing patterns",
                &["org_id"],
            )],
        ),
        AgentName::OnboardingCoach => (
            "IntentVision Onboarding Coach - Setup assistance",
            vec!["connection_guidance", "metric_configuration"],
            vec![Skill::new(
                "Guide Connection",
                "Guide user through connecting a data source",
                &["org_id", "source_type"],
            )],
        ),
    }
}
