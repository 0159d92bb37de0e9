//! Gateway configuration.
//!
//! Loaded from environment variables, with the same names and defaults the
//! deployed agents use. All fields have serde defaults so the struct can also
//! be built from a partial JSON document in tests.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agents::{AgentName, SessionLimits};

/// How the gateway reaches its agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Run every agent inside this process.
    #[default]
    InProcess,
    /// Forward to remote A2A endpoints (`AGENT_ENDPOINT_<AGENT>`).
    Remote,
    /// Echo stub; no agents are wired.
    Stub,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inprocess" | "in-process" | "in_process" => Ok(Self::InProcess),
            "remote" => Ok(Self::Remote),
            "stub" => Ok(Self::Stub),
            other => Err(format!("expected inprocess, remote or stub, got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error("AGENT_BACKEND=remote but {0} is not set")]
    MissingEndpoint(String),
}

/// Where the agents are deployed; feeds identities and SPIFFE ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub project_id: String,
    pub location: String,
    pub env: String,
}

impl Default for Deployment {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            location: default_location(),
            env: default_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_env")]
    pub env: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the IntentVision platform API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    /// SearXNG-compatible search endpoint for `google_search`.
    #[serde(default)]
    pub search_api_url: Option<String>,

    /// Per-agent model overrides.
    #[serde(default)]
    pub models: BTreeMap<AgentName, String>,

    #[serde(default = "default_dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,
    #[serde(default)]
    pub backend: BackendKind,
    /// Remote A2A endpoints, used when `backend` is `remote`.
    #[serde(default)]
    pub endpoints: BTreeMap<AgentName, String>,

    /// SQLite file for session memory. In-memory store when unset.
    #[serde(default)]
    pub memory_db_path: Option<PathBuf>,
    #[serde(default = "default_memory_queue_capacity")]
    pub memory_queue_capacity: usize,

    /// Sessions each agent keeps in process.
    #[serde(default = "default_session_cache_capacity")]
    pub session_cache_capacity: usize,
    /// Turns kept per session.
    #[serde(default = "default_session_max_turns")]
    pub session_max_turns: usize,
}

fn default_project_id() -> String { "intentvision".to_string() }
fn default_location() -> String { "us-central1".to_string() }
fn default_env() -> String { "dev".to_string() }
fn default_port() -> u16 { 8081 }
fn default_api_url() -> String { "https://intentvision.intent-solutions.io".to_string() }
fn default_dispatch_timeout_secs() -> u64 { 30 }
fn default_memory_queue_capacity() -> usize { 256 }
fn default_session_cache_capacity() -> usize { 1024 }
fn default_session_max_turns() -> usize { 100 }

/// Model used when no `<AGENT>_MODEL` override is set.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            location: default_location(),
            env: default_env(),
            port: default_port(),
            api_url: default_api_url(),
            api_key: String::new(),
            search_api_url: None,
            models: BTreeMap::new(),
            dispatch_timeout_secs: default_dispatch_timeout_secs(),
            backend: BackendKind::default(),
            endpoints: BTreeMap::new(),
            memory_db_path: None,
            memory_queue_capacity: default_memory_queue_capacity(),
            session_cache_capacity: default_session_cache_capacity(),
            session_max_turns: default_session_max_turns(),
        }
    }
}

impl GatewayConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let mut models = BTreeMap::new();
        let mut endpoints = BTreeMap::new();
        for agent in AgentName::ALL {
            if let Some(model) = var(agent.model_env_var().as_str()) {
                models.insert(agent, model);
            }
            if let Some(endpoint) = var(agent.endpoint_env_var().as_str()) {
                endpoints.insert(agent, endpoint);
            }
        }

        let config = Self {
            project_id: var("PROJECT_ID").unwrap_or(defaults.project_id),
            location: var("LOCATION").unwrap_or(defaults.location),
            env: var("ENV").unwrap_or(defaults.env),
            port: parse_var("PORT", var("PORT"), defaults.port)?,
            api_url: var("INTENTVISION_API_URL").unwrap_or(defaults.api_url),
            api_key: var("INTENTVISION_API_KEY").unwrap_or_default(),
            search_api_url: var("SEARCH_API_URL"),
            models,
            dispatch_timeout_secs: parse_var(
                "DISPATCH_TIMEOUT_SECS",
                var("DISPATCH_TIMEOUT_SECS"),
                defaults.dispatch_timeout_secs,
            )?,
            backend: parse_var("AGENT_BACKEND", var("AGENT_BACKEND"), defaults.backend)?,
            endpoints,
            memory_db_path: var("MEMORY_DB_PATH").map(PathBuf::from),
            memory_queue_capacity: parse_var(
                "MEMORY_QUEUE_CAPACITY",
                var("MEMORY_QUEUE_CAPACITY"),
                defaults.memory_queue_capacity,
            )?,
            session_cache_capacity: parse_var(
                "SESSION_CACHE_CAPACITY",
                var("SESSION_CACHE_CAPACITY"),
                defaults.session_cache_capacity,
            )?,
            session_max_turns: parse_var(
                "SESSION_MAX_TURNS",
                var("SESSION_MAX_TURNS"),
                defaults.session_max_turns,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "DISPATCH_TIMEOUT_SECS".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.memory_queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "MEMORY_QUEUE_CAPACITY".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.session_cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_CACHE_CAPACITY".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.session_max_turns < 2 {
            return Err(ConfigError::Invalid {
                var: "SESSION_MAX_TURNS".to_string(),
                reason: "must hold at least one exchange (2 turns)".to_string(),
            });
        }
        if self.backend == BackendKind::Remote {
            if let Some(agent) = AgentName::ALL
                .into_iter()
                .find(|a| !self.endpoints.contains_key(a))
            {
                return Err(ConfigError::MissingEndpoint(agent.endpoint_env_var()));
            }
        }
        Ok(())
    }

    pub fn deployment(&self) -> Deployment {
        Deployment {
            project_id: self.project_id.clone(),
            location: self.location.clone(),
            env: self.env.clone(),
        }
    }

    pub fn model_for(&self, agent: AgentName) -> &str {
        self.models
            .get(&agent)
            .map(String::as_str)
            .unwrap_or(DEFAULT_MODEL)
    }

    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            max_sessions: self.session_cache_capacity,
            max_turns: self.session_max_turns,
        }
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: name.to_string(),
            reason: e.to_string(),
        }),
    }
}
