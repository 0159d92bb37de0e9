//! Agent names: the routing key used by the gateway and the profile table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The four IntentVision agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentName {
    Orchestrator,
    MetricAnalyst,
    AlertTuner,
    OnboardingCoach,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown agent: {0}")]
pub struct UnknownAgent(pub String);

impl AgentName {
    /// Every agent, in listing order.
    pub const ALL: [AgentName; 4] = [
        AgentName::Orchestrator,
        AgentName::MetricAnalyst,
        AgentName::AlertTuner,
        AgentName::OnboardingCoach,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orchestrator => "orchestrator",
            Self::MetricAnalyst => "metric-analyst",
            Self::AlertTuner => "alert-tuner",
            Self::OnboardingCoach => "onboarding-coach",
        }
    }

    /// Name published on the agent card.
    ///
    /// The orchestrator carries the product prefix; specialists use their
    /// routing name.
    pub fn card_name(&self) -> &'static str {
        match self {
            Self::Orchestrator => "intentvision-orchestrator",
            other => other.as_str(),
        }
    }

    /// Env var overriding the model for this agent, e.g. `ALERT_TUNER_MODEL`.
    pub fn model_env_var(&self) -> String {
        format!("{}_MODEL", self.env_suffix())
    }

    /// Env var holding the remote A2A endpoint, e.g. `AGENT_ENDPOINT_ALERT_TUNER`.
    pub fn endpoint_env_var(&self) -> String {
        format!("AGENT_ENDPOINT_{}", self.env_suffix())
    }

    fn env_suffix(&self) -> String {
        self.as_str().replace('-', "_").to_uppercase()
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentName {
    type Err = UnknownAgent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownAgent(s.to_string()))
    }
}
