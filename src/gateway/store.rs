//! Terminal task records.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::task::TerminalTask;

/// Insert-once store of finished tasks, keyed by task id.
///
/// Records are never replaced or removed.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: DashMap<String, TerminalTask>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `task`. Returns `false` if a task with the same id exists; the
    /// stored record is left untouched.
    pub fn insert(&self, task: TerminalTask) -> bool {
        match self.tasks.entry(task.task_id().to_string()) {
            Entry::Occupied(_) => {
                log::warn!("Task {} already recorded; keeping the first record", task.task_id());
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(task);
                true
            }
        }
    }

    pub fn get(&self, task_id: &str) -> Option<TerminalTask> {
        self.tasks.get(task_id).map(|t| t.value().clone())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2a::{TaskRequest, TaskState};
    use crate::agents::AgentName;
    use crate::gateway::task::PendingTask;
    use serde_json::json;

    fn finished() -> TerminalTask {
        let request = TaskRequest {
            skill: "Guide Connection".to_string(),
            input: json!({"org_id": "acme", "source_type": "csv"}),
            session_id: None,
            trace_id: None,
        };
        PendingTask::new(AgentName::OnboardingCoach, request)
            .start()
            .complete(json!({"response": "done"}))
    }

    #[test]
    fn test_insert_and_get() {
        let store = TaskStore::new();
        let task = finished();
        let id = task.task_id().to_string();
        assert!(store.insert(task));
        assert_eq!(store.get(&id).unwrap().status().status, TaskState::Completed);
        assert!(store.get("task-missing").is_none());
    }

    #[test]
    fn test_insert_once() {
        let store = TaskStore::new();
        let task = finished();
        assert!(store.insert(task.clone()));
        assert!(!store.insert(task));
        assert_eq!(store.len(), 1);
    }
}
