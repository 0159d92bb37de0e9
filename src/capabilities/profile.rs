//! Capability profiles: which tools each agent may invoke.
//!
//! Profiles are fixed at startup and validated against the tool registry,
//! so a typo in a tool name fails bootstrap instead of surfacing mid-turn.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::toolbox::ScopedToolbox;
use crate::agents::AgentName;
use crate::tools::ToolRegistry;

pub const ORCHESTRATOR_TOOLS: &[&str] = &["google_search", "get_forecast", "get_anomalies"];

pub const METRIC_ANALYST_TOOLS: &[&str] = &[
    "get_forecast",
    "get_anomalies",
    "get_metric_history",
    "google_search",
];

pub const ALERT_TUNER_TOOLS: &[&str] = &["get_alert_rules", "get_alert_history", "get_metric_history"];

pub const ONBOARDING_COACH_TOOLS: &[&str] = &["list_connectors", "run_pipeline", "google_search"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("profile for '{agent}' references unregistered tool '{tool}'")]
    UnknownTool { agent: AgentName, tool: String },

    #[error("profile for '{agent}' lists tool '{tool}' more than once")]
    DuplicateTool { agent: AgentName, tool: String },

    #[error("no capability profile for agent '{0}'")]
    MissingProfile(AgentName),
}

/// Agent → ordered tool names.
#[derive(Debug, Clone)]
pub struct CapabilityProfiles {
    profiles: HashMap<AgentName, Vec<String>>,
    registry: Arc<ToolRegistry>,
}

impl CapabilityProfiles {
    /// Build and validate a profile table.
    ///
    /// Every agent must have a profile and every tool must be registered.
    pub fn new<'a, I>(registry: Arc<ToolRegistry>, entries: I) -> Result<Self, ProfileError>
    where
        I: IntoIterator<Item = (AgentName, &'a [&'a str])>,
    {
        let mut profiles = HashMap::new();
        for (agent, tools) in entries {
            let mut names: Vec<String> = Vec::with_capacity(tools.len());
            for tool in tools {
                if !registry.contains(tool) {
                    return Err(ProfileError::UnknownTool {
                        agent,
                        tool: tool.to_string(),
                    });
                }
                if names.iter().any(|n| n == tool) {
                    return Err(ProfileError::DuplicateTool {
                        agent,
                        tool: tool.to_string(),
                    });
                }
                names.push(tool.to_string());
            }
            profiles.insert(agent, names);
        }

        if let Some(missing) = AgentName::ALL.into_iter().find(|a| !profiles.contains_key(a)) {
            return Err(ProfileError::MissingProfile(missing));
        }

        for agent in AgentName::ALL {
            log::debug!("Profile {}: {:?}", agent, profiles[&agent]);
        }

        Ok(Self { profiles, registry })
    }

    /// The IntentVision profile table.
    pub fn standard(registry: Arc<ToolRegistry>) -> Result<Self, ProfileError> {
        Self::new(
            registry,
            [
                (AgentName::Orchestrator, ORCHESTRATOR_TOOLS),
                (AgentName::MetricAnalyst, METRIC_ANALYST_TOOLS),
                (AgentName::AlertTuner, ALERT_TUNER_TOOLS),
                (AgentName::OnboardingCoach, ONBOARDING_COACH_TOOLS),
            ],
        )
    }

    /// Tool names the agent may invoke, in declaration order.
    pub fn profile_for(&self, agent: AgentName) -> &[String] {
        self.profiles.get(&agent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Toolbox restricted to the agent's profile.
    pub fn toolbox(&self, agent: AgentName) -> ScopedToolbox {
        ScopedToolbox::new(
            agent,
            self.profile_for(agent).to_vec(),
            self.registry.clone(),
        )
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }
}
