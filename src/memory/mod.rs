//! Session memory.
//!
//! After every agent turn the runtime hands a snapshot of the session to a
//! [`MemoryWriter`], which persists it through a [`MemoryService`] on a
//! background task. Persistence is best-effort: failures are logged and
//! never reach the caller.

pub mod in_memory;
pub mod sqlite;
pub mod writer;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agents::AgentName;

pub use in_memory::InMemoryMemory;
pub use sqlite::SqliteMemory;
pub use writer::MemoryWriter;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One message in a session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Snapshot of a session handed to memory after a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub agent: AgentName,
    /// SPIFFE id of the agent that owns the session.
    pub spiffe_id: String,
    pub turns: Vec<Turn>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for MemoryError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Long-term store for session transcripts.
#[async_trait]
pub trait MemoryService: Send + Sync + fmt::Debug {
    /// Insert or replace the stored copy of a session.
    async fn add_session(&self, record: &SessionRecord) -> Result<(), MemoryError>;

    /// Load a stored session.
    async fn load_session(
        &self,
        agent: AgentName,
        session_id: &str,
    ) -> Result<Option<SessionRecord>, MemoryError>;
}
