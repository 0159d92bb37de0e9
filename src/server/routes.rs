//! Axum route handlers for the A2A gateway.
//!
//! # Routes
//!
//! - `GET  /health`                                   - Gateway health
//! - `GET  /agents`                                   - Agent names, in listing order
//! - `GET  /agents/:name/.well-known/agent-card.json` - Agent card
//! - `POST /agents/:name/tasks`                       - Submit a task
//! - `GET  /agents/:name/tasks/:task_id`              - Read back a task
//! - `POST /agents/:name/chat`                        - Orchestrator chat

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::a2a::{
    AgentCard, ChatRequest, ChatResponse, GatewayError, GatewayHealth, TaskRequest, TaskStatus,
};
use crate::gateway::TaskGateway;

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    pub gateway: Arc<TaskGateway>,
}

impl AppState {
    pub fn new(gateway: Arc<TaskGateway>) -> Self {
        Self { gateway }
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/agents", get(list_agents_handler))
        .route(
            "/agents/:name/.well-known/agent-card.json",
            get(agent_card_handler),
        )
        .route("/agents/:name/tasks", post(submit_task_handler))
        .route("/agents/:name/tasks/:task_id", get(get_task_handler))
        .route("/agents/:name/chat", post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health - always 200.
async fn health_handler(State(state): State<AppState>) -> Json<GatewayHealth> {
    Json(state.gateway.health().await)
}

/// GET /agents
async fn list_agents_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.gateway.list_agents())
}

async fn agent_card_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<AgentCard>, GatewayError> {
    state.gateway.get_agent_card(&name).map(Json)
}

/// POST /agents/:name/tasks
///
/// The agent is resolved before the body is looked at, so an unknown agent
/// is 404 even when the body is malformed.
async fn submit_task_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<Json<TaskStatus>, GatewayError> {
    state.gateway.directory().resolve(&name)?;
    let Json(request) = body.map_err(|e| GatewayError::Validation(e.body_text()))?;
    state.gateway.submit_task(&name, request).await.map(Json)
}

async fn get_task_handler(
    State(state): State<AppState>,
    Path((name, task_id)): Path<(String, String)>,
) -> Result<Json<TaskStatus>, GatewayError> {
    state.gateway.get_task(&name, &task_id).map(Json)
}

/// POST /agents/:name/chat - orchestrator only.
async fn chat_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, GatewayError> {
    state.gateway.directory().resolve(&name)?;
    let Json(request) = body.map_err(|e| GatewayError::Validation(e.body_text()))?;
    state.gateway.chat(&name, request).await.map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::a2a::StubBackend;
    use crate::gateway::tests::{gateway_with, FailingBackend};

    fn app() -> Router {
        app_router(AppState::new(Arc::new(gateway_with(Arc::new(StubBackend)))))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["agents"]["orchestrator"], "available");
    }

    #[tokio::test]
    async fn test_every_listed_agent_card_resolves() {
        let (status, body) = send(app(), get("/agents")).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<String> = serde_json::from_value(body).unwrap();
        assert_eq!(names.len(), 4);

        for name in names {
            let uri = format!("/agents/{}/.well-known/agent-card.json", name);
            let (status, card) = send(app(), get(&uri)).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(card["protocol_version"], "0.3.0");
        }
    }

    #[tokio::test]
    async fn test_unknown_agent_is_404() {
        let (status, body) =
            send(app(), get("/agents/billing/.well-known/agent-card.json")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "not_found", "detail": "Agent not found: billing"}));

        let (status, _) = send(
            app(),
            post_json("/agents/billing/tasks", r#"{"skill": "x", "input": {}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_body_to_unknown_agent_is_404() {
        for uri in ["/agents/billing/tasks", "/agents/billing/chat"] {
            let (status, body) = send(app(), post_json(uri, "{not json")).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
            assert_eq!(body["error"], "not_found");
        }
    }

    #[tokio::test]
    async fn test_submit_and_fetch_task() {
        let app = app();
        let (status, task) = send(
            app.clone(),
            post_json(
                "/agents/onboarding-coach/tasks",
                r#"{"skill": "Guide Connection", "input": {"org_id": "acme", "source_type": "stripe"}}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["status"], "completed");
        assert!(task["error"].is_null());

        let uri = format!("/agents/onboarding-coach/tasks/{}", task["task_id"].as_str().unwrap());
        let (status, fetched) = send(app.clone(), get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, task);

        let (status, _) = send(app, get("/agents/onboarding-coach/tasks/task-missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_task_bodies_are_400() {
        let (status, body) = send(app(), post_json("/agents/alert-tuner/tasks", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, _) = send(
            app(),
            post_json("/agents/alert-tuner/tasks", r#"{"skill": "Guide Connection", "input": {}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app(),
            post_json("/agents/alert-tuner/tasks", r#"{"skill": "Analyze Alerts", "input": {}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_backend_failure_is_200_failed_task() {
        let app = app_router(AppState::new(Arc::new(gateway_with(Arc::new(FailingBackend)))));
        let (status, task) = send(
            app,
            post_json(
                "/agents/alert-tuner/tasks",
                r#"{"skill": "Analyze Alerts", "input": {"org_id": "acme"}}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["status"], "failed");
        assert!(task["error"].is_string());
    }

    #[tokio::test]
    async fn test_chat() {
        let (status, _) = send(
            app(),
            post_json("/agents/orchestrator/chat", r#"{"org_id": "acme"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app(),
            post_json("/agents/orchestrator/chat", r#"{"message": "hi"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            app(),
            post_json("/agents/orchestrator/chat", r#"{"message": "hi", "org_id": "acme"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["response"].is_string());
        assert!(body["session_id"].is_string());
    }

    #[tokio::test]
    async fn test_chat_on_specialist_is_404() {
        let (status, _) = send(
            app(),
            post_json("/agents/metric-analyst/chat", r#"{"message": "hi", "org_id": "acme"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
