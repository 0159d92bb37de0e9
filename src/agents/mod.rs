//! IntentVision agents.
//!
//! Identities (card data, SPIFFE ids, instruction text), the runtime that
//! binds an identity to its toolbox and reasoning loop, and the in-process
//! backend the gateway uses to reach local runtimes.

pub mod definitions;
pub mod in_process;
pub mod instructions;
pub mod name;
pub mod runtime;

pub use definitions::{gateway_spiffe_id, AgentIdentity, Skill, AGENT_VERSION};
pub use in_process::InProcessBackend;
pub use name::{AgentName, UnknownAgent};
pub use runtime::{
    AgentReply, AgentRuntime, AgentTurn, Reasoner, RuntimeError, RuntimeMap, ScriptedReasoner,
    SessionLimits, StubReasoner,
};
