//! Gateway error taxonomy.
//!
//! Every variant maps to one HTTP status and one `error` kind string; the
//! server renders them as `{"error": <kind>, "detail": <message>}`.

use thiserror::Error;

use crate::agents::UnknownAgent;
use crate::capabilities::ProfileError;
use crate::config::ConfigError;
use crate::memory::MemoryError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Malformed body, unknown skill, or input that violates a skill schema.
    #[error("{0}")]
    Validation(String),

    /// Unknown agent or task.
    #[error("{0}")]
    NotFound(String),

    /// The backend failed to produce a reply. Folded into a failed task on
    /// task submission; surfaced only by chat.
    #[error("{0}")]
    Backend(String),

    /// Bootstrap could not assemble the gateway.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// Kind string used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Backend(_) => "backend_error",
            Self::Configuration(_) => "configuration_error",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Backend(_) => 502,
            Self::Configuration(_) => 500,
        }
    }
}

impl From<UnknownAgent> for GatewayError {
    fn from(e: UnknownAgent) -> Self {
        Self::NotFound(format!("Agent not found: {}", e.0))
    }
}

impl From<ConfigError> for GatewayError {
    fn from(e: ConfigError) -> Self {
        Self::Configuration(e.to_string())
    }
}

impl From<ProfileError> for GatewayError {
    fn from(e: ProfileError) -> Self {
        Self::Configuration(e.to_string())
    }
}

impl From<MemoryError> for GatewayError {
    fn from(e: MemoryError) -> Self {
        Self::Configuration(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_agent_is_not_found() {
        let err = GatewayError::from(UnknownAgent("nope".to_string()));
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.kind(), "not_found");
        assert_eq!(err.to_string(), "Agent not found: nope");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(GatewayError::Validation("x".into()).status_code(), 400);
        assert_eq!(GatewayError::Backend("x".into()).status_code(), 502);
    }
}
