//! Task lifecycle.
//!
//! A task moves `pending -> running -> {completed, failed}` exactly once.
//! Each state is its own type and every transition consumes the previous
//! state, so a terminal task cannot be restarted or completed twice.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::a2a::{TaskRequest, TaskState, TaskStatus};
use crate::agents::AgentName;

fn new_task_id(agent: AgentName) -> String {
    format!("task-{}-{}", agent, uuid::Uuid::new_v4())
}

/// `now`, but never earlier than `previous`.
fn now_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous)
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A task that has been accepted but not yet dispatched.
#[derive(Debug, Clone)]
pub struct PendingTask {
    task_id: String,
    agent: AgentName,
    request: TaskRequest,
    created_at: DateTime<Utc>,
}

impl PendingTask {
    pub fn new(agent: AgentName, request: TaskRequest) -> Self {
        Self {
            task_id: new_task_id(agent),
            agent,
            request,
            created_at: Utc::now(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn request(&self) -> &TaskRequest {
        &self.request
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus {
            task_id: self.task_id.clone(),
            status: TaskState::Pending,
            created_at: rfc3339(self.created_at),
            updated_at: rfc3339(self.created_at),
            result: None,
            error: None,
        }
    }

    /// Mark the task as dispatched.
    pub fn start(self) -> RunningTask {
        let started_at = now_after(self.created_at);
        log::debug!("Task {} running on {}", self.task_id, self.agent);
        RunningTask {
            task_id: self.task_id,
            agent: self.agent,
            request: self.request,
            created_at: self.created_at,
            started_at,
        }
    }
}

/// A task whose message is with the backend.
#[derive(Debug, Clone)]
pub struct RunningTask {
    task_id: String,
    agent: AgentName,
    request: TaskRequest,
    created_at: DateTime<Utc>,
    started_at: DateTime<Utc>,
}

impl RunningTask {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn request(&self) -> &TaskRequest {
        &self.request
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus {
            task_id: self.task_id.clone(),
            status: TaskState::Running,
            created_at: rfc3339(self.created_at),
            updated_at: rfc3339(self.started_at),
            result: None,
            error: None,
        }
    }

    pub fn complete(self, result: Value) -> TerminalTask {
        self.finish(TaskState::Completed, Some(result), None)
    }

    pub fn fail(self, error: impl Into<String>) -> TerminalTask {
        self.finish(TaskState::Failed, None, Some(error.into()))
    }

    fn finish(self, state: TaskState, result: Option<Value>, error: Option<String>) -> TerminalTask {
        let finished_at = now_after(self.started_at);
        TerminalTask {
            agent: self.agent,
            status: TaskStatus {
                task_id: self.task_id,
                status: state,
                created_at: rfc3339(self.created_at),
                updated_at: rfc3339(finished_at),
                result,
                error,
            },
        }
    }
}

/// A task in `completed` or `failed`. Immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalTask {
    agent: AgentName,
    status: TaskStatus,
}

impl TerminalTask {
    pub fn agent(&self) -> AgentName {
        self.agent
    }

    pub fn task_id(&self) -> &str {
        &self.status.task_id
    }

    pub fn status(&self) -> &TaskStatus {
        &self.status
    }

    pub fn into_status(self) -> TaskStatus {
        self.status
    }
}
