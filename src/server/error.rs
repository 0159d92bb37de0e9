//! JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::a2a::GatewayError;

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            log::error!("{} ({}): {}", self.kind(), status, self);
        }
        (
            status,
            Json(json!({"error": self.kind(), "detail": self.to_string()})),
        )
            .into_response()
    }
}
