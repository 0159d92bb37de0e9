//! A2A (Agent-to-Agent) protocol surface.
//!
//! Wire types published by the gateway, the error taxonomy, agent-card
//! checks, and the clients that reach backend agents.

pub mod card_check;
pub mod client;
pub mod errors;
pub mod types;

pub use client::{AgentBackend, AgentLocator, BackendError, BackendReply, RemoteBackend, StubBackend};
pub use errors::GatewayError;
pub use types::{
    AgentAvailability, AgentCard, AgentSkill, ChatRequest, ChatResponse, GatewayHealth,
    TaskRequest, TaskState, TaskStatus, PROTOCOL_VERSION,
};
