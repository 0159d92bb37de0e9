//! Background session writer.
//!
//! The reply path enqueues snapshots with `try_send` and never waits: if the
//! queue is full or the worker has stopped, the snapshot is dropped with a
//! warning. The worker persists snapshots in order and logs failures.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{MemoryService, SessionRecord};

#[derive(Debug, Clone)]
pub struct MemoryWriter {
    tx: mpsc::Sender<SessionRecord>,
}

impl MemoryWriter {
    /// Start the worker on the current tokio runtime.
    ///
    /// The worker exits once every `MemoryWriter` clone has been dropped and
    /// the queue is drained.
    pub fn spawn(service: Arc<dyn MemoryService>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<SessionRecord>(capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                match service.add_session(&record).await {
                    Ok(()) => log::info!(
                        "Saved session {} to memory [spiffe={}]",
                        record.session_id,
                        record.spiffe_id
                    ),
                    Err(e) => log::error!(
                        "Failed to save session {} to memory: {} [spiffe={}]",
                        record.session_id,
                        e,
                        record.spiffe_id
                    ),
                }
            }
            log::debug!("Memory writer stopped");
        });

        (Self { tx }, handle)
    }

    /// Enqueue a snapshot. Returns whether it was accepted.
    pub fn submit(&self, record: SessionRecord) -> bool {
        match self.tx.try_send(record) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(record)) => {
                log::warn!(
                    "Memory queue full; dropping snapshot of session {} [spiffe={}]",
                    record.session_id,
                    record.spiffe_id
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(record)) => {
                log::warn!(
                    "Memory writer stopped; dropping snapshot of session {} [spiffe={}]",
                    record.session_id,
                    record.spiffe_id
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentName;
    use crate::memory::{InMemoryMemory, MemoryError, Turn};
    use async_trait::async_trait;
    use chrono::Utc;

    fn record(session_id: &str) -> SessionRecord {
        SessionRecord {
            session_id: session_id.to_string(),
            agent: AgentName::Orchestrator,
            spiffe_id: "spiffe://test".to_string(),
            turns: vec![Turn::user("hi")],
            updated_at: Utc::now(),
        }
    }

    #[derive(Debug)]
    struct BrokenMemory;

    #[async_trait]
    impl MemoryService for BrokenMemory {
        async fn add_session(&self, _record: &SessionRecord) -> Result<(), MemoryError> {
            Err(MemoryError::Storage("disk on fire".to_string()))
        }

        async fn load_session(
            &self,
            _agent: AgentName,
            _session_id: &str,
        ) -> Result<Option<SessionRecord>, MemoryError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_worker_persists_and_stops_when_dropped() {
        let memory = Arc::new(InMemoryMemory::new());
        let (writer, handle) = MemoryWriter::spawn(memory.clone(), 8);

        assert!(writer.submit(record("a")));
        assert!(writer.submit(record("b")));
        drop(writer);
        handle.await.unwrap();

        assert_eq!(memory.len(), 2);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_worker() {
        let (writer, handle) = MemoryWriter::spawn(Arc::new(BrokenMemory), 4);
        assert!(writer.submit(record("a")));
        assert!(writer.submit(record("b")));
        drop(writer);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        // Current-thread runtime: the worker cannot run until this test yields.
        let (writer, _handle) = MemoryWriter::spawn(Arc::new(InMemoryMemory::new()), 1);
        assert!(writer.submit(record("a")));
        assert!(!writer.submit(record("b")));
    }

    #[tokio::test]
    async fn test_closed_worker_drops_snapshot() {
        let (writer, handle) = MemoryWriter::spawn(Arc::new(InMemoryMemory::new()), 1);
        handle.abort();
        let _ = handle.await;
        assert!(!writer.submit(record("a")));
    }
}
