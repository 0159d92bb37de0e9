//! Logging setup and structured agent events.
//!
//! Library code logs through the `log` facade. The binary installs a
//! `tracing-subscriber` with an `EnvFilter`, which also receives `log`
//! records. Agent events are emitted as `tracing` events whose fields always
//! include the SPIFFE id of the agent they concern.

use serde::Serialize;
use serde_json::{Map, Value};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,intentvision_agents=debug";

/// Install the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Kind of agent event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentEventKind {
    TaskSubmitted,
    TaskCompleted,
    TaskFailed,
    ChatHandled,
    TurnCompleted,
}

impl AgentEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskSubmitted => "task_submitted",
            Self::TaskCompleted => "task_completed",
            Self::TaskFailed => "task_failed",
            Self::ChatHandled => "chat_handled",
            Self::TurnCompleted => "turn_completed",
        }
    }
}

/// A structured event about one agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentEvent {
    pub event_type: AgentEventKind,
    pub agent: String,
    pub spiffe_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl AgentEvent {
    pub fn new(event_type: AgentEventKind, agent: &str, spiffe_id: &str) -> Self {
        Self {
            event_type,
            agent: agent.to_string(),
            spiffe_id: spiffe_id.to_string(),
            task_id: None,
            data: Map::new(),
        }
    }

    pub fn with_task(mut self, task_id: &str) -> Self {
        self.task_id = Some(task_id.to_string());
        self
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Emit the event through `tracing`.
    pub fn emit(&self) {
        let data = Value::Object(self.data.clone());
        match self.event_type {
            AgentEventKind::TaskFailed => tracing::warn!(
                event_type = self.event_type.as_str(),
                agent = %self.agent,
                spiffe_id = %self.spiffe_id,
                task_id = self.task_id.as_deref().unwrap_or(""),
                data = %data,
                "Agent event: {}",
                self.event_type.as_str()
            ),
            _ => tracing::info!(
                event_type = self.event_type.as_str(),
                agent = %self.agent,
                spiffe_id = %self.spiffe_id,
                task_id = self.task_id.as_deref().unwrap_or(""),
                data = %data,
                "Agent event: {}",
                self.event_type.as_str()
            ),
        }
    }
}
