//! `POST /v1beta/models/{model}:generateContent` and
//! `POST /v1beta/models/{model}:streamGenerateContent` (§4.7, §4.9, §6).
//!
//! Matched behind a single wildcard route since axum's router cannot split a
//! literal suffix (`:generateContent`) out of a path parameter; the model
//! name and RPC are recovered by hand from the tail segment instead.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use pollux_schema::gemini::GeminiGenerateContentRequest;
use tracing::debug;

use crate::error::{GatewayError, Schema};
use crate::server::dispatch;
use crate::server::state::GatewayState;
use crate::translate::{native_to_upstream, response, sse};
use crate::utils::with_pretty_json_debug;

use super::sse_response;

pub async fn handler(
    State(state): State<GatewayState>,
    Path(path): Path<String>,
    Json(body): Json<GeminiGenerateContentRequest>,
) -> Response {
    match run(&state, &path, body).await {
        Ok(resp) => resp,
        Err(error) => error.into_response(Schema::Native),
    }
}

fn split_model_and_rpc(path: &str) -> Result<(&str, &str), GatewayError> {
    let last = path.rsplit('/').next().unwrap_or(path);
    last.split_once(':')
        .ok_or_else(|| GatewayError::internal(format!("malformed RPC path: {path}")))
}

async fn run(
    state: &GatewayState,
    path: &str,
    body: GeminiGenerateContentRequest,
) -> Result<Response, GatewayError> {
    let (model, rpc) = split_model_and_rpc(path)?;
    let stream = rpc == "streamGenerateContent";

    with_pretty_json_debug(&body, |pretty| {
        debug!(channel = "gemini", model, rpc, body = %pretty, "extracted request body");
    });

    let (access_token, project) = state.prepare().await?;
    let envelope = native_to_upstream(body, model, project)?;

    if stream {
        let upstream =
            dispatch::send_stream(state, "streamGenerateContent", &access_token, &envelope).await?;
        Ok(sse_response(upstream, sse::SseSchema::Native, model.to_string()))
    } else {
        let raw = dispatch::send_unary(state, "generateContent", &access_token, &envelope).await?;
        let upstream_body = response::parse_upstream_unary(&raw)?;
        Ok(Json(response::to_native(upstream_body)).into_response())
    }
}
