//! SQLite-backed session memory.
//!
//! rusqlite is synchronous, so every operation opens a connection inside
//! `tokio::task::spawn_blocking`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::{MemoryError, MemoryService, SessionRecord};
use crate::agents::AgentName;

#[derive(Debug, Clone)]
pub struct SqliteMemory {
    db_path: PathBuf,
}

impl SqliteMemory {
    /// Open (creating if needed) the database at `db_path`.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self, MemoryError> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Storage(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
        let memory = Self { db_path };
        memory.initialize_db()?;
        Ok(memory)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn initialize_db(&self) -> Result<(), MemoryError> {
        let conn = Connection::open(&self.db_path).map_err(|e| {
            log::error!(
                "MEMORY ERROR: failed to open session database {}: {}",
                self.db_path.display(),
                e
            );
            MemoryError::from(e)
        })?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS agent_sessions (
                agent TEXT NOT NULL,
                session_id TEXT NOT NULL,
                spiffe_id TEXT NOT NULL,
                record TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (agent, session_id)
            )",
            [],
        )?;
        Ok(())
    }
}

#[async_trait]
impl MemoryService for SqliteMemory {
    async fn add_session(&self, record: &SessionRecord) -> Result<(), MemoryError> {
        let db_path = self.db_path.clone();
        let agent = record.agent.as_str();
        let session_id = record.session_id.clone();
        let spiffe_id = record.spiffe_id.clone();
        let updated_at = record.updated_at.to_rfc3339();
        let json = serde_json::to_string(record)?;

        tokio::task::spawn_blocking(move || -> Result<(), MemoryError> {
            let conn = Connection::open(&db_path)?;
            conn.execute(
                "INSERT INTO agent_sessions (agent, session_id, spiffe_id, record, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(agent, session_id) DO UPDATE SET
                    spiffe_id = excluded.spiffe_id,
                    record = excluded.record,
                    updated_at = excluded.updated_at",
                params![agent, session_id, spiffe_id, json, updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| MemoryError::Storage(format!("blocking task failed: {}", e)))?
    }

    async fn load_session(
        &self,
        agent: AgentName,
        session_id: &str,
    ) -> Result<Option<SessionRecord>, MemoryError> {
        let db_path = self.db_path.clone();
        let session_id = session_id.to_string();

        let raw = tokio::task::spawn_blocking(move || -> Result<Option<String>, MemoryError> {
            let conn = Connection::open(&db_path)?;
            conn.query_row(
                "SELECT record FROM agent_sessions WHERE agent = ?1 AND session_id = ?2",
                params![agent.as_str(), session_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(MemoryError::from)
        })
        .await
        .map_err(|e| MemoryError::Storage(format!("blocking task failed: {}", e)))??;

        raw.map(|json| serde_json::from_str(&json).map_err(MemoryError::from))
            .transpose()
    }
}
