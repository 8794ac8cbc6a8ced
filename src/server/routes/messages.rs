//! `POST /v1/messages` (§4.7, §4.9, §6).

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use pollux_schema::anthropic::AnthropicMessagesRequest;
use tracing::debug;

use crate::error::{GatewayError, Schema};
use crate::server::dispatch;
use crate::server::state::GatewayState;
use crate::translate::{anthropic_to_upstream, response, sse};
use crate::utils::with_pretty_json_debug;

use super::sse_response;

pub async fn handler(
    State(state): State<GatewayState>,
    Json(body): Json<AnthropicMessagesRequest>,
) -> Response {
    match run(&state, body).await {
        Ok(resp) => resp,
        Err(error) => error.into_response(Schema::Anthropic),
    }
}

async fn run(state: &GatewayState, body: AnthropicMessagesRequest) -> Result<Response, GatewayError> {
    with_pretty_json_debug(&body, |pretty| {
        debug!(channel = "messages", body = %pretty, "extracted request body");
    });

    let model = body.model.clone();
    let stream = body.stream;

    let (access_token, project) = state.prepare().await?;
    let envelope = anthropic_to_upstream(&body, project)?;

    if stream {
        let upstream =
            dispatch::send_stream(state, "streamGenerateContent", &access_token, &envelope).await?;
        Ok(sse_response(upstream, sse::SseSchema::Anthropic, model))
    } else {
        let raw = dispatch::send_unary(state, "generateContent", &access_token, &envelope).await?;
        let upstream_body = response::parse_upstream_unary(&raw)?;
        Ok(Json(response::to_anthropic(&upstream_body, &model)).into_response())
    }
}
