//! Agent Task Gateway.
//!
//! One front door for several independently addressable agents: agent
//! discovery, card publication, task submission and retrieval, health, and
//! the orchestrator chat shortcut. Task submission is synchronous; the
//! caller always gets back a terminal task, and backend failures are
//! reported inside it rather than as an error.

pub mod directory;
pub mod store;
pub mod task;

pub use directory::{AgentDirectory, DirectoryEntry};
pub use store::TaskStore;
pub use task::{PendingTask, RunningTask, TerminalTask};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::Instrument;

use crate::a2a::{
    AgentBackend, AgentCard, AgentLocator, BackendError, BackendReply, ChatRequest, ChatResponse,
    GatewayError, GatewayHealth, TaskRequest, TaskStatus,
};
use crate::agents::{gateway_spiffe_id, AgentName};
use crate::config::Deployment;
use crate::telemetry::{AgentEvent, AgentEventKind};

/// Default bound on a single backend dispatch.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct TaskGateway {
    directory: AgentDirectory,
    backend: Arc<dyn AgentBackend>,
    tasks: TaskStore,
    deployment: Deployment,
    dispatch_timeout: Duration,
}

impl TaskGateway {
    pub fn new(
        directory: AgentDirectory,
        backend: Arc<dyn AgentBackend>,
        deployment: Deployment,
    ) -> Self {
        Self {
            directory,
            backend,
            tasks: TaskStore::new(),
            deployment,
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    pub fn directory(&self) -> &AgentDirectory {
        &self.directory
    }

    pub fn gateway_id(&self) -> String {
        format!("a2a-gateway-{}", self.deployment.env)
    }

    /// Registered agent names, in listing order.
    pub fn list_agents(&self) -> Vec<String> {
        self.directory.names().map(|n| n.as_str().to_string()).collect()
    }

    pub fn get_agent_card(&self, name: &str) -> Result<AgentCard, GatewayError> {
        Ok(self.directory.resolve(name)?.card.clone())
    }

    /// Run one skill on an agent and return the terminal task.
    ///
    /// Unknown agents are NotFound; unknown skills and inputs that violate
    /// the skill's schema are Validation errors and create no task. Every
    /// other outcome, including backend errors and timeouts, is a stored
    /// task in `completed` or `failed`.
    pub async fn submit_task(
        &self,
        name: &str,
        request: TaskRequest,
    ) -> Result<TaskStatus, GatewayError> {
        let entry = self.directory.resolve(name)?;
        let identity = &entry.identity;

        let skill = identity.skill(&request.skill).ok_or_else(|| {
            GatewayError::Validation(format!(
                "Unknown skill '{}' for agent {}",
                request.skill, identity.name
            ))
        })?;
        skill.validate_input(&request.input).map_err(GatewayError::Validation)?;

        let message = format!(
            "Execute skill '{}' with input: {}",
            request.skill,
            serde_json::to_string(&request.input)
                .map_err(|e| GatewayError::Validation(e.to_string()))?
        );

        let pending = PendingTask::new(identity.name, request);
        let span = tracing::info_span!(
            "submit_task",
            agent = %identity.name,
            task_id = %pending.task_id(),
            spiffe_id = %identity.spiffe_id,
        );

        async move {
            AgentEvent::new(AgentEventKind::TaskSubmitted, identity.name.as_str(), &identity.spiffe_id)
                .with_task(pending.task_id())
                .with("skill", pending.request().skill.as_str())
                .emit();

            let running = pending.start();
            let request = running.request();
            let outcome = self
                .dispatch(&entry.locator(), &message, request.session_id.as_deref())
                .await;

            let terminal = match outcome {
                Ok(mut reply) => {
                    if reply.trace_id.is_none() {
                        reply.trace_id = request.trace_id.clone();
                    }
                    let done = running.complete(reply.to_value());
                    AgentEvent::new(AgentEventKind::TaskCompleted, identity.name.as_str(), &identity.spiffe_id)
                        .with_task(done.task_id())
                        .emit();
                    done
                }
                Err(e) => {
                    let done = running.fail(e.to_string());
                    AgentEvent::new(AgentEventKind::TaskFailed, identity.name.as_str(), &identity.spiffe_id)
                        .with_task(done.task_id())
                        .with("error", e.to_string())
                        .emit();
                    done
                }
            };

            let status = terminal.status().clone();
            self.tasks.insert(terminal);
            Ok(status)
        }
        .instrument(span)
        .await
    }

    /// A stored task of `name`. Tasks of other agents are NotFound.
    pub fn get_task(&self, name: &str, task_id: &str) -> Result<TaskStatus, GatewayError> {
        let entry = self.directory.resolve(name)?;
        self.tasks
            .get(task_id)
            .filter(|task| task.agent() == entry.identity.name)
            .map(TerminalTask::into_status)
            .ok_or_else(|| GatewayError::NotFound(format!("Task not found: {}", task_id)))
    }

    /// Orchestrator chat. `message` and `org_id` are required and non-empty.
    pub async fn chat(&self, name: &str, request: ChatRequest) -> Result<ChatResponse, GatewayError> {
        let entry = self.directory.resolve(name)?;
        if entry.identity.name != AgentName::Orchestrator {
            return Err(GatewayError::NotFound(format!(
                "Chat is only available on the orchestrator, not {}",
                name
            )));
        }

        let message = required(request.message, "message")?;
        let org_id = required(request.org_id, "org_id")?;
        let prefixed = format!("[Organization: {}] {}", org_id, message);

        let reply = self
            .dispatch(&entry.locator(), &prefixed, request.session_id.as_deref())
            .await
            .map_err(|e| GatewayError::Backend(e.to_string()))?;

        AgentEvent::new(AgentEventKind::ChatHandled, entry.identity.name.as_str(), &entry.identity.spiffe_id)
            .with("org_id", org_id)
            .with("session_id", reply.session_id.as_str())
            .emit();

        Ok(ChatResponse {
            response: reply.response,
            session_id: reply.session_id,
            trace_id: reply.trace_id,
        })
    }

    /// Gateway health. Always healthy; per-agent status is advisory.
    pub async fn health(&self) -> GatewayHealth {
        let checks = self.directory.entries().map(|entry| async move {
            let status = self.backend.status(&entry.locator()).await;
            (entry.identity.name.as_str().to_string(), status)
        });
        let agents: BTreeMap<_, _> = futures::future::join_all(checks).await.into_iter().collect();

        GatewayHealth {
            status: "healthy".to_string(),
            gateway_id: self.gateway_id(),
            spiffe_id: gateway_spiffe_id(&self.deployment),
            timestamp: Utc::now().to_rfc3339(),
            agents,
        }
    }

    async fn dispatch(
        &self,
        locator: &AgentLocator,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<BackendReply, BackendError> {
        match tokio::time::timeout(
            self.dispatch_timeout,
            self.backend.send(locator, message, session_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                agent: locator.agent,
                after: self.dispatch_timeout,
            }),
        }
    }
}

/// Absent or empty is missing; whitespace is passed through to the agent.
fn required(value: Option<String>, field: &str) -> Result<String, GatewayError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(GatewayError::Validation(format!("Missing required field: {}", field))),
    }
}
