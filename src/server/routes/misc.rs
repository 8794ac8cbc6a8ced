//! `GET /` and `GET /health` (§6): liveness probes, no auth required.

use axum::Json;
use axum::http::StatusCode;
use serde_json::json;

pub async fn root() -> &'static str {
    "pollux gateway"
}

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
