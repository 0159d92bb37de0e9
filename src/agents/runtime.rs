//! Agent runtime wrapper.
//!
//! Binds an identity (model, instruction), a profile-scoped toolbox and a
//! [`Reasoner`] into an invocable agent. The runtime owns per-session
//! transcripts, bounded by [`SessionLimits`], and after every successful
//! turn hands a snapshot of the session to the memory writer. Memory
//! failures never alter the reply.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{Map, Value};
use thiserror::Error;

use super::definitions::AgentIdentity;
use crate::capabilities::ScopedToolbox;
use crate::memory::{MemoryWriter, SessionRecord, Turn};
use crate::telemetry::{AgentEvent, AgentEventKind};

/// Input to one reasoning step.
#[derive(Debug, Clone, Copy)]
pub struct AgentTurn<'a> {
    pub identity: &'a AgentIdentity,
    pub session_id: &'a str,
    pub message: &'a str,
    /// Earlier turns of this session, oldest first.
    pub history: &'a [Turn],
}

/// The LLM reasoning loop.
///
/// Implementations decide which tools to call (through `tools`, which only
/// exposes the agent's profile) and produce the reply text.
#[async_trait]
pub trait Reasoner: Send + Sync + fmt::Debug {
    async fn respond(&self, turn: AgentTurn<'_>, tools: &ScopedToolbox) -> anyhow::Result<String>;
}

/// Deterministic reasoner used when no model is wired.
#[derive(Debug, Clone, Default)]
pub struct StubReasoner;

#[async_trait]
impl Reasoner for StubReasoner {
    async fn respond(&self, turn: AgentTurn<'_>, _tools: &ScopedToolbox) -> anyhow::Result<String> {
        Ok(format!(
            "[Stub] Agent {} received: {}",
            turn.identity.engine_id, turn.message
        ))
    }
}

/// One rule of a [`ScriptedReasoner`].
#[derive(Debug, Clone)]
struct Script {
    keyword: String,
    tool_call: Option<(String, Map<String, Value>)>,
    reply: String,
}

/// Keyword-driven reasoner.
///
/// The first rule whose keyword occurs in the message wins. A rule may
/// invoke one tool before replying; `{tool_result}` in the reply is replaced
/// with the tool's JSON result. Messages matching no rule fail the turn.
#[derive(Debug, Clone, Default)]
pub struct ScriptedReasoner {
    scripts: Vec<Script>,
}

impl ScriptedReasoner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, keyword: &str, reply: &str) -> Self {
        self.scripts.push(Script {
            keyword: keyword.to_string(),
            tool_call: None,
            reply: reply.to_string(),
        });
        self
    }

    pub fn call_tool(mut self, keyword: &str, tool: &str, args: Value, reply: &str) -> Self {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.scripts.push(Script {
            keyword: keyword.to_string(),
            tool_call: Some((tool.to_string(), args)),
            reply: reply.to_string(),
        });
        self
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn respond(&self, turn: AgentTurn<'_>, tools: &ScopedToolbox) -> anyhow::Result<String> {
        let script = self
            .scripts
            .iter()
            .find(|s| turn.message.contains(&s.keyword))
            .ok_or_else(|| anyhow::anyhow!("no scripted reply for message: {}", turn.message))?;

        match &script.tool_call {
            Some((tool, args)) => {
                let result = tools.invoke(tool, args).await?;
                Ok(script
                    .reply
                    .replace("{tool_result}", &result.to_value().to_string()))
            }
            None => Ok(script.reply.clone()),
        }
    }
}

/// Reply of one agent turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("agent {agent} failed to respond: {source}")]
    Reasoning {
        agent: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Bounds on the transcripts a runtime keeps in process.
///
/// Sessions past `max_sessions` are evicted least recently used first; a
/// session keeps only its last `max_turns` turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub max_turns: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 1024,
            max_turns: 100,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Session {
    turns: Vec<Turn>,
    last_used: u64,
}

/// An invocable agent.
pub struct AgentRuntime {
    identity: Arc<AgentIdentity>,
    toolbox: ScopedToolbox,
    reasoner: Arc<dyn Reasoner>,
    sessions: DashMap<String, Session>,
    limits: SessionLimits,
    clock: AtomicU64,
    memory: Option<MemoryWriter>,
}

impl fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("agent", &self.identity.name)
            .field("model", &self.identity.model)
            .field("tools", &self.toolbox.tool_names())
            .field("reasoner", &self.reasoner)
            .field("sessions", &self.sessions.len())
            .field("limits", &self.limits)
            .field("memory", &self.memory.is_some())
            .finish()
    }
}

impl AgentRuntime {
    pub fn new(
        identity: Arc<AgentIdentity>,
        toolbox: ScopedToolbox,
        reasoner: Arc<dyn Reasoner>,
        memory: Option<MemoryWriter>,
    ) -> Self {
        log::info!(
            "Created agent {} with model {} and {} tools [spiffe={}]",
            identity.name,
            identity.model,
            toolbox.tool_names().len(),
            identity.spiffe_id
        );
        Self {
            identity,
            toolbox,
            reasoner,
            sessions: DashMap::new(),
            limits: SessionLimits::default(),
            clock: AtomicU64::new(0),
            memory,
        }
    }

    pub fn with_session_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = SessionLimits {
            max_sessions: limits.max_sessions.max(1),
            max_turns: limits.max_turns.max(2),
        };
        self
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    /// Transcript of a session held by this runtime.
    pub fn transcript(&self, session_id: &str) -> Option<Vec<Turn>> {
        self.sessions
            .get(session_id)
            .map(|session| session.value().turns.clone())
    }

    /// Number of sessions held in process.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Run one turn. A missing session id starts a new session.
    pub async fn run(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<AgentReply, RuntimeError> {
        let session_id = session_id
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("session-{}", uuid::Uuid::new_v4()));

        let history = self.transcript(&session_id).unwrap_or_default();
        let turn = AgentTurn {
            identity: &self.identity,
            session_id: &session_id,
            message,
            history: &history,
        };

        let response = self
            .reasoner
            .respond(turn, &self.toolbox)
            .await
            .map_err(|source| RuntimeError::Reasoning {
                agent: self.identity.name.to_string(),
                source,
            })?;

        {
            let mut session = self.sessions.entry(session_id.clone()).or_default();
            session.turns.push(Turn::user(message));
            session.turns.push(Turn::agent(response.clone()));
            let excess = session.turns.len().saturating_sub(self.limits.max_turns);
            session.turns.drain(..excess);
            session.last_used = self.clock.fetch_add(1, Ordering::Relaxed);
            // Enqueued under the entry lock so snapshots of one session
            // reach the writer in turn order.
            self.persist(&session_id, session.turns.clone());
        }
        self.evict_idle_sessions();

        AgentEvent::new(
            AgentEventKind::TurnCompleted,
            self.identity.name.as_str(),
            &self.identity.spiffe_id,
        )
        .with("session_id", session_id.as_str())
        .emit();

        Ok(AgentReply {
            response,
            session_id,
        })
    }

    fn evict_idle_sessions(&self) {
        while self.sessions.len() > self.limits.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.value().last_used)
                .map(|entry| entry.key().clone());
            let Some(session_id) = oldest else {
                break;
            };
            self.sessions.remove(&session_id);
            log::debug!(
                "Evicted idle session {} from agent {}",
                session_id,
                self.identity.name
            );
        }
    }

    fn persist(&self, session_id: &str, turns: Vec<Turn>) {
        let Some(writer) = &self.memory else {
            return;
        };
        writer.submit(SessionRecord {
            session_id: session_id.to_string(),
            agent: self.identity.name,
            spiffe_id: self.identity.spiffe_id.clone(),
            turns,
            updated_at: Utc::now(),
        });
    }
}

/// Runtimes keyed by agent, as built at bootstrap.
pub type RuntimeMap = HashMap<super::AgentName, Arc<AgentRuntime>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentName;
    use crate::capabilities::CapabilityProfiles;
    use crate::config::Deployment;
    use crate::memory::{InMemoryMemory, MemoryError, MemoryService};
    use crate::tools::{PlatformClient, ToolRegistry};
    use serde_json::json;

    fn runtime(
        agent: AgentName,
        reasoner: Arc<dyn Reasoner>,
        memory: Option<MemoryWriter>,
    ) -> AgentRuntime {
        let client = Arc::new(PlatformClient::new("http://127.0.0.1:9", ""));
        let profiles =
            CapabilityProfiles::standard(Arc::new(ToolRegistry::with_platform(client, None))).unwrap();
        let identity = Arc::new(AgentIdentity::new(agent, &Deployment::default(), "test-model"));
        AgentRuntime::new(identity, profiles.toolbox(agent), reasoner, memory)
    }

    #[derive(Debug)]
    struct BrokenMemory;

    #[async_trait]
    impl MemoryService for BrokenMemory {
        async fn add_session(&self, _record: &SessionRecord) -> Result<(), MemoryError> {
            Err(MemoryError::Storage("unavailable".to_string()))
        }

        async fn load_session(
            &self,
            _agent: AgentName,
            _session_id: &str,
        ) -> Result<Option<SessionRecord>, MemoryError> {
            Err(MemoryError::Storage("unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_stub_reply_and_fresh_session() {
        let rt = runtime(AgentName::Orchestrator, Arc::new(StubReasoner), None);
        let reply = rt.run("hello", None).await.unwrap();

        assert_eq!(
            reply.response,
            "[Stub] Agent intentvision-orchestrator-dev received: hello"
        );
        assert!(reply.session_id.starts_with("session-"));
        assert_eq!(rt.transcript(&reply.session_id).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_session_transcript_accumulates() {
        let reasoner = ScriptedReasoner::new().reply("", "ok");
        let rt = runtime(AgentName::MetricAnalyst, Arc::new(reasoner), None);

        let first = rt.run("one", Some("session-x")).await.unwrap();
        let second = rt.run("two", Some("session-x")).await.unwrap();

        assert_eq!(first.session_id, "session-x");
        assert_eq!(second.session_id, "session-x");
        let turns = rt.transcript("session-x").unwrap();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[2].text, "two");
    }

    #[tokio::test]
    async fn test_reasoner_failure_is_error_and_not_recorded() {
        let rt = runtime(AgentName::AlertTuner, Arc::new(ScriptedReasoner::new()), None);
        let err = rt.run("anything", Some("s")).await.unwrap_err();
        assert!(err.to_string().contains("alert-tuner"));
        assert!(rt.transcript("s").is_none());
    }

    #[tokio::test]
    async fn test_out_of_profile_tool_fails_turn() {
        let reasoner = ScriptedReasoner::new().call_tool(
            "pipeline",
            "run_pipeline",
            json!({"org_id": "acme"}),
            "started",
        );
        let rt = runtime(AgentName::AlertTuner, Arc::new(reasoner), None);
        let err = rt.run("run the pipeline", None).await.unwrap_err();
        assert!(err.to_string().contains("not permitted"));
    }

    #[tokio::test]
    async fn test_tool_result_in_reply() {
        let reasoner = ScriptedReasoner::new().call_tool(
            "connect",
            "list_connectors",
            json!({}),
            "connectors: {tool_result}",
        );
        let rt = runtime(AgentName::OnboardingCoach, Arc::new(reasoner), None);
        let reply = rt.run("how do I connect stripe?", None).await.unwrap();
        assert!(reply.response.contains("\"stripe\""));
    }

    #[tokio::test]
    async fn test_session_is_persisted_to_memory() {
        let memory = Arc::new(InMemoryMemory::new());
        let (writer, handle) = MemoryWriter::spawn(memory.clone(), 4);
        let rt = runtime(AgentName::Orchestrator, Arc::new(StubReasoner), Some(writer));

        let reply = rt.run("hello", Some("session-m")).await.unwrap();
        drop(rt);
        handle.await.unwrap();

        let stored = memory
            .load_session(AgentName::Orchestrator, &reply.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.turns.len(), 2);
        assert_eq!(
            stored.spiffe_id,
            "spiffe://intent-solutions.io/agent/intentvision-orchestrator/dev/us-central1/0.14.1"
        );
    }

    #[tokio::test]
    async fn test_memory_failure_does_not_change_reply() {
        let (writer, handle) = MemoryWriter::spawn(Arc::new(BrokenMemory), 4);
        let with_memory = runtime(AgentName::Orchestrator, Arc::new(StubReasoner), Some(writer));
        let without_memory = runtime(AgentName::Orchestrator, Arc::new(StubReasoner), None);

        let a = with_memory.run("hi", Some("s")).await.unwrap();
        let b = without_memory.run("hi", Some("s")).await.unwrap();
        assert_eq!(a, b);

        drop(with_memory);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_session_cache_stays_at_capacity() {
        let rt = runtime(AgentName::Orchestrator, Arc::new(StubReasoner), None)
            .with_session_limits(SessionLimits {
                max_sessions: 8,
                max_turns: 10,
            });

        let first = rt.run("first", None).await.unwrap();
        for _ in 0..100 {
            rt.run("hello", None).await.unwrap();
        }
        assert_eq!(rt.session_count(), 8);
        assert!(rt.transcript(&first.session_id).is_none());
    }

    #[tokio::test]
    async fn test_recently_used_session_survives_eviction() {
        let rt = runtime(AgentName::Orchestrator, Arc::new(StubReasoner), None)
            .with_session_limits(SessionLimits {
                max_sessions: 2,
                max_turns: 10,
            });

        rt.run("a", Some("session-keep")).await.unwrap();
        rt.run("b", Some("session-drop")).await.unwrap();
        rt.run("c", Some("session-keep")).await.unwrap();
        rt.run("d", Some("session-new")).await.unwrap();

        assert!(rt.transcript("session-keep").is_some());
        assert!(rt.transcript("session-drop").is_none());
        assert!(rt.transcript("session-new").is_some());
    }

    #[tokio::test]
    async fn test_transcript_keeps_last_turns() {
        let rt = runtime(AgentName::MetricAnalyst, Arc::new(StubReasoner), None)
            .with_session_limits(SessionLimits {
                max_sessions: 4,
                max_turns: 6,
            });

        for i in 0..200 {
            rt.run(&format!("message {}", i), Some("session-long")).await.unwrap();
        }
        let turns = rt.transcript("session-long").unwrap();
        assert_eq!(turns.len(), 6);
        assert_eq!(turns[4].text, "message 199");
    }

    #[tokio::test]
    async fn test_concurrent_turns_persist_latest_snapshot() {
        let memory = Arc::new(InMemoryMemory::new());
        let (writer, handle) = MemoryWriter::spawn(memory.clone(), 256);
        let rt = Arc::new(runtime(AgentName::Orchestrator, Arc::new(StubReasoner), Some(writer)));

        let turns = (0..20).map(|i| {
            let rt = rt.clone();
            tokio::spawn(async move { rt.run(&format!("m{}", i), Some("session-c")).await })
        });
        for result in futures::future::join_all(turns).await {
            result.unwrap().unwrap();
        }
        drop(rt);
        handle.await.unwrap();

        let stored = memory
            .load_session(AgentName::Orchestrator, "session-c")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.turns.len(), 40);
    }
}
