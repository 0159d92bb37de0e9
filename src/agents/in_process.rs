//! Backend that runs agents inside the gateway process.

use async_trait::async_trait;

use super::runtime::RuntimeMap;
use crate::a2a::{AgentAvailability, AgentBackend, AgentLocator, BackendError, BackendReply};

#[derive(Debug, Clone, Default)]
pub struct InProcessBackend {
    runtimes: RuntimeMap,
}

impl InProcessBackend {
    pub fn new(runtimes: RuntimeMap) -> Self {
        Self { runtimes }
    }
}

#[async_trait]
impl AgentBackend for InProcessBackend {
    async fn send(
        &self,
        locator: &AgentLocator,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<BackendReply, BackendError> {
        let runtime = self
            .runtimes
            .get(&locator.agent)
            .ok_or_else(|| BackendError::Unreachable {
                agent: locator.agent,
                message: "agent is not running in this process".to_string(),
            })?;
        log::debug!(
            "Dispatching to {} ({})",
            locator.engine_id,
            runtime.identity().spiffe_id
        );

        let reply = runtime
            .run(message, session_id)
            .await
            .map_err(|e| BackendError::Agent {
                agent: locator.agent,
                message: e.to_string(),
            })?;

        Ok(BackendReply::new(locator, reply.session_id, reply.response))
    }

    async fn status(&self, locator: &AgentLocator) -> AgentAvailability {
        if self.runtimes.contains_key(&locator.agent) {
            AgentAvailability::Available
        } else {
            AgentAvailability::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::agents::{AgentIdentity, AgentName, AgentRuntime, ScriptedReasoner};
    use crate::capabilities::CapabilityProfiles;
    use crate::config::Deployment;
    use crate::tools::{PlatformClient, ToolRegistry};

    fn backend() -> InProcessBackend {
        let client = Arc::new(PlatformClient::new("http://127.0.0.1:9", ""));
        let profiles =
            CapabilityProfiles::standard(Arc::new(ToolRegistry::with_platform(client, None))).unwrap();
        let identity = Arc::new(AgentIdentity::new(
            AgentName::MetricAnalyst,
            &Deployment::default(),
            "m",
        ));
        let runtime = AgentRuntime::new(
            identity,
            profiles.toolbox(AgentName::MetricAnalyst),
            Arc::new(ScriptedReasoner::new().reply("Explain Forecast", "trend is upward")),
            None,
        );
        InProcessBackend::new(RuntimeMap::from([(AgentName::MetricAnalyst, Arc::new(runtime))]))
    }

    fn locator(agent: AgentName) -> AgentLocator {
        AgentLocator {
            agent,
            engine_id: format!("intentvision-{}-dev", agent),
        }
    }

    #[tokio::test]
    async fn test_send_runs_local_agent() {
        let reply = backend()
            .send(
                &locator(AgentName::MetricAnalyst),
                "Execute skill 'Explain Forecast' with input: {}",
                Some("session-1"),
            )
            .await
            .unwrap();
        assert_eq!(reply.response, "trend is upward");
        assert_eq!(reply.session_id, "session-1");
        assert_eq!(reply.agent_engine_id, "intentvision-metric-analyst-dev");
    }

    #[tokio::test]
    async fn test_reasoning_failure_is_agent_error() {
        let err = backend()
            .send(&locator(AgentName::MetricAnalyst), "unscripted", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Agent { .. }));
    }

    #[tokio::test]
    async fn test_missing_runtime_is_unreachable() {
        let backend = backend();
        let err = backend
            .send(&locator(AgentName::AlertTuner), "hi", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unreachable { .. }));
        assert_eq!(
            backend.status(&locator(AgentName::AlertTuner)).await,
            AgentAvailability::Unavailable
        );
    }
}
