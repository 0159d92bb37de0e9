//! Backend agent clients.
//!
//! From the gateway's point of view an agent is "send a message, get a
//! structured reply". [`AgentBackend`] abstracts how the agent is reached:
//! in the same process (`agents::InProcessBackend`), over A2A JSON-RPC
//! ([`RemoteBackend`]), or not at all ([`StubBackend`]).

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::types::AgentAvailability;
use crate::agents::AgentName;

/// Where an agent lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentLocator {
    pub agent: AgentName,
    /// Agent-engine id, e.g. `intentvision-alert-tuner-dev`.
    pub engine_id: String,
}

/// Structured reply from an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendReply {
    pub session_id: String,
    pub response: String,
    pub agent_engine_id: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl BackendReply {
    pub fn new(locator: &AgentLocator, session_id: String, response: String) -> Self {
        Self {
            session_id,
            response,
            agent_engine_id: locator.engine_id.clone(),
            timestamp: Utc::now().to_rfc3339(),
            trace_id: None,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("agent {agent} is unreachable: {message}")]
    Unreachable { agent: AgentName, message: String },

    #[error("agent {agent} did not reply within {after:?}")]
    Timeout { agent: AgentName, after: Duration },

    #[error("agent {agent} sent an invalid reply: {message}")]
    Protocol { agent: AgentName, message: String },

    #[error("agent {agent} failed: {message}")]
    Agent { agent: AgentName, message: String },
}

#[async_trait]
pub trait AgentBackend: Send + Sync + fmt::Debug {
    /// Deliver `message` to the agent and wait for its reply.
    async fn send(
        &self,
        locator: &AgentLocator,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<BackendReply, BackendError>;

    /// Advisory availability check.
    async fn status(&self, locator: &AgentLocator) -> AgentAvailability;
}

// ---------------------------------------------------------------------------
// StubBackend
// ---------------------------------------------------------------------------

/// Echoes every message without reaching an agent.
#[derive(Debug, Clone, Default)]
pub struct StubBackend;

#[async_trait]
impl AgentBackend for StubBackend {
    async fn send(
        &self,
        locator: &AgentLocator,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<BackendReply, BackendError> {
        let session_id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| format!("session-{}", locator.engine_id));
        Ok(BackendReply::new(
            locator,
            session_id,
            format!("[Stub] Agent {} received: {}", locator.engine_id, message),
        ))
    }

    async fn status(&self, _locator: &AgentLocator) -> AgentAvailability {
        AgentAvailability::Available
    }
}

// ---------------------------------------------------------------------------
// RemoteBackend
// ---------------------------------------------------------------------------

/// Bound on the agent-card fetch behind [`AgentBackend::status`].
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Reaches agents deployed as A2A services.
///
/// Messages are sent as JSON-RPC `message/send` to `<endpoint>/a2a`; the
/// session id travels as the A2A `context_id`.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    endpoints: HashMap<AgentName, String>,
    http: reqwest::Client,
    timeout: Duration,
    status_timeout: Duration,
}

impl RemoteBackend {
    pub fn new(endpoints: HashMap<AgentName, String>, timeout: Duration) -> Self {
        Self {
            endpoints,
            http: reqwest::Client::new(),
            timeout,
            status_timeout: STATUS_TIMEOUT.min(timeout),
        }
    }

    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = timeout;
        self
    }

    fn endpoint(&self, agent: AgentName) -> Result<&str, BackendError> {
        self.endpoints
            .get(&agent)
            .map(|e| e.trim_end_matches('/'))
            .ok_or_else(|| BackendError::Unreachable {
                agent,
                message: "no endpoint configured".to_string(),
            })
    }

    fn transport_error(&self, agent: AgentName, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout {
                agent,
                after: self.timeout,
            }
        } else {
            BackendError::Unreachable {
                agent,
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl AgentBackend for RemoteBackend {
    async fn send(
        &self,
        locator: &AgentLocator,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<BackendReply, BackendError> {
        let agent = locator.agent;
        let url = format!("{}/a2a", self.endpoint(agent)?);
        log::debug!("Sending A2A message to {} at {}", agent, url);

        let mut params = json!({
            "message": {
                "role": "user",
                "parts": [{"text": message}],
            }
        });
        if let Some(sid) = session_id {
            params["context_id"] = Value::String(sid.to_string());
        }
        let rpc_body = json!({
            "jsonrpc": "2.0",
            "method": "message/send",
            "id": uuid::Uuid::new_v4().to_string(),
            "params": params,
        });

        let resp = self
            .http
            .post(&url)
            .json(&rpc_body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(agent, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Unreachable {
                agent,
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let rpc_resp: Value = resp.json().await.map_err(|e| BackendError::Protocol {
            agent,
            message: e.to_string(),
        })?;

        if let Some(error) = rpc_resp.get("error") {
            return Err(BackendError::Agent {
                agent,
                message: error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string()),
            });
        }

        let result = rpc_resp.get("result").ok_or_else(|| BackendError::Protocol {
            agent,
            message: "response has neither result nor error".to_string(),
        })?;

        let state = result
            .pointer("/status/state")
            .and_then(|s| s.as_str())
            .unwrap_or("completed");
        if state == "failed" || state == "canceled" {
            return Err(BackendError::Agent {
                agent,
                message: format!("task ended in state {}", state),
            });
        }

        let text = result
            .pointer("/artifacts/0/parts/0/text")
            .or_else(|| result.pointer("/status/message/parts/0/text"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| BackendError::Protocol {
                agent,
                message: "reply carries no text part".to_string(),
            })?;

        let session_id = result
            .get("context_id")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .or_else(|| session_id.map(str::to_string))
            .unwrap_or_else(|| format!("session-{}", uuid::Uuid::new_v4()));

        let mut reply = BackendReply::new(locator, session_id, text.to_string());
        reply.trace_id = result
            .pointer("/metadata/trace_id")
            .and_then(|t| t.as_str())
            .map(str::to_string);
        Ok(reply)
    }

    async fn status(&self, locator: &AgentLocator) -> AgentAvailability {
        let Ok(endpoint) = self.endpoint(locator.agent) else {
            return AgentAvailability::Unavailable;
        };
        let url = format!("{}/.well-known/agent-card.json", endpoint);
        match self.http.get(&url).timeout(self.status_timeout).send().await {
            Ok(resp) if resp.status().is_success() => AgentAvailability::Available,
            Ok(resp) => {
                log::debug!("Agent card for {} returned HTTP {}", locator.agent, resp.status());
                AgentAvailability::Unavailable
            }
            Err(e) => {
                log::debug!("Agent card for {} unreachable: {}", locator.agent, e);
                AgentAvailability::Unavailable
            }
        }
    }
}
