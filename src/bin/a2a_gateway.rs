//! IntentVision A2A gateway binary.
//!
//! Serves the agent gateway over HTTP: discovery, agent cards, task
//! submission and the orchestrator chat shortcut.
//!
//! # Environment Variables
//!
//! - `PORT` - HTTP port (default: 8081)
//! - `PROJECT_ID`, `LOCATION`, `ENV` - Deployment coordinates
//! - `INTENTVISION_API_URL`, `INTENTVISION_API_KEY` - Platform API for tools
//! - `SEARCH_API_URL` - SearXNG endpoint for `google_search`
//! - `AGENT_BACKEND` - `inprocess` (default), `remote` or `stub`
//! - `AGENT_ENDPOINT_<AGENT>` - Remote A2A endpoints when `AGENT_BACKEND=remote`
//! - `DISPATCH_TIMEOUT_SECS` - Bound on one backend dispatch (default: 30)
//! - `MEMORY_DB_PATH` - SQLite session memory (in-memory when unset)
//! - `SESSION_CACHE_CAPACITY` - Sessions kept per agent (default: 1024)
//! - `SESSION_MAX_TURNS` - Turns kept per session transcript (default: 100)
//! - `RUST_LOG` - Tracing filter (default: "info,intentvision_agents=debug")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin a2a-gateway
//! ```

use anyhow::Context;
use intentvision_agents::bootstrap::build_gateway;
use intentvision_agents::config::GatewayConfig;
use intentvision_agents::server::app_router;
use intentvision_agents::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    let bind_addr = config.bind_addr();
    let state = build_gateway(&config).context("failed to assemble gateway")?;
    let gateway_id = state.gateway.gateway_id();
    let app = app_router(state);

    tracing::info!("{} v{} starting on {}", gateway_id, intentvision_agents::AGENT_VERSION, bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /agents");
    tracing::info!("  GET  /agents/:name/.well-known/agent-card.json");
    tracing::info!("  POST /agents/:name/tasks");
    tracing::info!("  GET  /agents/:name/tasks/:task_id");
    tracing::info!("  POST /agents/orchestrator/chat");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
