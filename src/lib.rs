//! # IntentVision Agents
//!
//! LLM-backed agents for the IntentVision metrics and forecasting platform,
//! and the A2A task gateway that fronts them.
//!
//! An orchestrator and three specialists (metric analyst, alert tuner,
//! onboarding coach) reach the platform through failure-safe HTTP tools.
//! Each agent may only use the tools of its capability profile. The gateway
//! publishes agent cards, accepts tasks, and routes each one to its agent
//! in-process or over A2A JSON-RPC.

pub mod a2a;
pub mod agents;
pub mod bootstrap;
pub mod capabilities;
pub mod config;
pub mod gateway;
pub mod memory;
pub mod server;
pub mod telemetry;
pub mod tools;

pub use a2a::{AgentCard, GatewayError, TaskRequest, TaskStatus};
pub use agents::{AgentIdentity, AgentName, AgentRuntime};
pub use agents::AGENT_VERSION;
pub use bootstrap::build_gateway;
pub use config::GatewayConfig;
pub use gateway::TaskGateway;
pub use tools::{Tool, ToolRegistry, ToolResult};
