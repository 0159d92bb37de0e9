//! Gateway assembly.
//!
//! Everything the gateway needs is built here, once, from a
//! [`GatewayConfig`]: the tool registry, capability profiles, agent
//! identities and directory, the memory writer, the agent runtimes and the
//! backend. Nothing is held in globals.

use std::collections::HashMap;
use std::sync::Arc;

use crate::a2a::{AgentBackend, GatewayError, RemoteBackend, StubBackend};
use crate::agents::{
    AgentIdentity, AgentName, AgentRuntime, InProcessBackend, Reasoner, RuntimeMap, StubReasoner,
};
use crate::capabilities::CapabilityProfiles;
use crate::config::{BackendKind, GatewayConfig};
use crate::gateway::{AgentDirectory, TaskGateway};
use crate::memory::{InMemoryMemory, MemoryService, MemoryWriter, SqliteMemory};
use crate::server::AppState;
use crate::tools::{PlatformClient, ToolRegistry};

/// Build the gateway with the stub reasoner.
///
/// Must run inside a tokio runtime: the memory writer is spawned here.
pub fn build_gateway(config: &GatewayConfig) -> Result<AppState, GatewayError> {
    build_gateway_with(config, Arc::new(StubReasoner))
}

/// Build the gateway with `reasoner` driving every in-process agent.
pub fn build_gateway_with(
    config: &GatewayConfig,
    reasoner: Arc<dyn Reasoner>,
) -> Result<AppState, GatewayError> {
    config.validate()?;
    let deployment = config.deployment();

    let identities: Vec<Arc<AgentIdentity>> = AgentName::ALL
        .into_iter()
        .map(|name| Arc::new(AgentIdentity::new(name, &deployment, config.model_for(name))))
        .collect();
    let directory = AgentDirectory::new(identities.iter().cloned())?;

    let backend: Arc<dyn AgentBackend> = match config.backend {
        BackendKind::InProcess => {
            let runtimes = build_runtimes(config, &identities, reasoner)?;
            Arc::new(InProcessBackend::new(runtimes))
        }
        BackendKind::Remote => {
            let endpoints: HashMap<AgentName, String> = config
                .endpoints
                .iter()
                .map(|(agent, url)| (*agent, url.clone()))
                .collect();
            Arc::new(RemoteBackend::new(endpoints, config.dispatch_timeout()))
        }
        BackendKind::Stub => Arc::new(StubBackend),
    };

    log::info!(
        "A2A gateway assembled: env={} location={} backend={:?} agents={}",
        deployment.env,
        deployment.location,
        config.backend,
        directory.len()
    );

    let gateway = TaskGateway::new(directory, backend, deployment)
        .with_dispatch_timeout(config.dispatch_timeout());
    Ok(AppState::new(Arc::new(gateway)))
}

fn build_runtimes(
    config: &GatewayConfig,
    identities: &[Arc<AgentIdentity>],
    reasoner: Arc<dyn Reasoner>,
) -> Result<RuntimeMap, GatewayError> {
    let client = Arc::new(PlatformClient::new(config.api_url.clone(), config.api_key.clone()));
    let registry = Arc::new(ToolRegistry::with_platform(
        client,
        config.search_api_url.clone(),
    ));
    let profiles = CapabilityProfiles::standard(registry)?;

    let memory: Arc<dyn MemoryService> = match &config.memory_db_path {
        Some(path) => {
            let sqlite = SqliteMemory::new(path.clone())?;
            log::info!("Session memory: SQLite at {}", sqlite.db_path().display());
            Arc::new(sqlite)
        }
        None => {
            let capacity = config.session_cache_capacity * AgentName::ALL.len();
            log::info!("Session memory: in-process, up to {} sessions", capacity);
            Arc::new(InMemoryMemory::with_capacity(capacity))
        }
    };
    let (writer, _worker) = MemoryWriter::spawn(memory, config.memory_queue_capacity);

    Ok(identities
        .iter()
        .map(|identity| {
            let runtime = AgentRuntime::new(
                identity.clone(),
                profiles.toolbox(identity.name),
                reasoner.clone(),
                Some(writer.clone()),
            )
            .with_session_limits(config.session_limits());
            (identity.name, Arc::new(runtime))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2a::{AgentAvailability, TaskRequest, TaskState};
    use serde_json::json;

    #[tokio::test]
    async fn test_in_process_gateway() {
        let state = build_gateway(&GatewayConfig::default()).unwrap();
        let status = state
            .gateway
            .submit_task(
                "alert-tuner",
                TaskRequest {
                    skill: "Analyze Alerts".to_string(),
                    input: json!({"org_id": "acme"}),
                    session_id: Some("session-1".to_string()),
                    trace_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(status.status, TaskState::Completed);
        let result = status.result.unwrap();
        assert_eq!(result["session_id"], "session-1");
        assert!(result["response"]
            .as_str()
            .unwrap()
            .starts_with("[Stub] Agent intentvision-alert-tuner-dev received: Execute skill"));
    }

    #[tokio::test]
    async fn test_sqlite_memory_and_deployment() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig {
            env: "staging".to_string(),
            memory_db_path: Some(dir.path().join("memory").join("sessions.db")),
            ..GatewayConfig::default()
        };
        let state = build_gateway(&config).unwrap();
        assert!(dir.path().join("memory").join("sessions.db").exists());
        assert_eq!(
            state.gateway.get_agent_card("orchestrator").unwrap().spiffe_id.as_deref(),
            Some("spiffe://intent-solutions.io/agent/intentvision-orchestrator/staging/us-central1/0.14.1")
        );
    }

    #[tokio::test]
    async fn test_unreachable_remote_agents_are_unavailable() {
        let config = GatewayConfig {
            backend: BackendKind::Remote,
            endpoints: AgentName::ALL
                .into_iter()
                .map(|a| (a, "http://127.0.0.1:9".to_string()))
                .collect(),
            dispatch_timeout_secs: 1,
            ..GatewayConfig::default()
        };
        let state = build_gateway(&config).unwrap();
        let health = state.gateway.health().await;
        assert_eq!(health.status, "healthy");
        assert!(health
            .agents
            .values()
            .all(|a| *a == AgentAvailability::Unavailable));
    }

    #[tokio::test]
    async fn test_session_limits_reach_runtimes() {
        let config = GatewayConfig {
            session_cache_capacity: 2,
            ..GatewayConfig::default()
        };
        let deployment = config.deployment();
        let identities = [Arc::new(AgentIdentity::new(
            AgentName::Orchestrator,
            &deployment,
            "m",
        ))];
        let runtimes = build_runtimes(&config, &identities, Arc::new(StubReasoner)).unwrap();
        let runtime = &runtimes[&AgentName::Orchestrator];
        for _ in 0..5 {
            runtime.run("hello", None).await.unwrap();
        }
        assert_eq!(runtime.session_count(), 2);
    }

    #[test]
    fn test_invalid_config_is_configuration_error() {
        let config = GatewayConfig {
            dispatch_timeout_secs: 0,
            ..GatewayConfig::default()
        };
        let err = build_gateway(&config).unwrap_err();
        assert_eq!(err.kind(), "configuration_error");
    }
}
