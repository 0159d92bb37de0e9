//! HTTP server for the A2A gateway.
//!
//! # Endpoints
//!
//! - `GET  /health` - Liveness probe with advisory per-agent status
//! - `GET  /agents` - Agent discovery
//! - `/agents/:name/...` - Cards, tasks and orchestrator chat
//!
//! Errors are JSON bodies of the form `{"error": <kind>, "detail": <message>}`.

pub mod error;
pub mod routes;

pub use routes::{app_router, AppState};
