//! Process-local session memory, used when no database path is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{MemoryError, MemoryService, SessionRecord};
use crate::agents::AgentName;

/// Sessions kept when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Holds at most `capacity` sessions; the least recently updated session is
/// dropped to make room for a new one.
#[derive(Debug)]
pub struct InMemoryMemory {
    sessions: RwLock<HashMap<(AgentName, String), SessionRecord>>,
    capacity: usize,
}

impl Default for InMemoryMemory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl InMemoryMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl MemoryService for InMemoryMemory {
    async fn add_session(&self, record: &SessionRecord) -> Result<(), MemoryError> {
        let mut sessions = self.sessions.write();
        let key = (record.agent, record.session_id.clone());
        if !sessions.contains_key(&key) && sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, stored)| stored.updated_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                log::debug!("Memory full; dropping session {}", oldest.1);
                sessions.remove(&oldest);
            }
        }
        sessions.insert(key, record.clone());
        Ok(())
    }

    async fn load_session(
        &self,
        agent: AgentName,
        session_id: &str,
    ) -> Result<Option<SessionRecord>, MemoryError> {
        Ok(self
            .sessions
            .read()
            .get(&(agent, session_id.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Turn;
    use chrono::Utc;

    #[tokio::test]
    async fn test_add_replaces_previous_snapshot() {
        let memory = InMemoryMemory::new();
        let mut record = SessionRecord {
            session_id: "session-1".to_string(),
            agent: AgentName::Orchestrator,
            spiffe_id: "spiffe://test".to_string(),
            turns: vec![Turn::user("hi")],
            updated_at: Utc::now(),
        };
        memory.add_session(&record).await.unwrap();
        record.turns.push(Turn::agent("hello"));
        memory.add_session(&record).await.unwrap();

        assert_eq!(memory.len(), 1);
        let stored = memory
            .load_session(AgentName::Orchestrator, "session-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.turns.len(), 2);
        assert!(memory
            .load_session(AgentName::AlertTuner, "session-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_capacity_drops_least_recently_updated() {
        let memory = InMemoryMemory::with_capacity(3);
        let start = Utc::now();
        for i in 0..10 {
            let record = SessionRecord {
                session_id: format!("session-{}", i),
                agent: AgentName::Orchestrator,
                spiffe_id: "spiffe://test".to_string(),
                turns: vec![Turn::user("hi")],
                updated_at: start + chrono::Duration::seconds(i),
            };
            memory.add_session(&record).await.unwrap();
        }

        assert_eq!(memory.len(), 3);
        for kept in ["session-7", "session-8", "session-9"] {
            assert!(memory
                .load_session(AgentName::Orchestrator, kept)
                .await
                .unwrap()
                .is_some());
        }
    }
}
