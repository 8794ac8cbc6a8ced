//! HTTP router (§4.1, §6): mounts every public endpoint behind the shared
//! auth guard (root and health excepted) and wraps the whole tree in the
//! access-log middleware.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue, Version, header::USER_AGENT};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use base64::Engine as _;
use rand::RngCore;
use std::time::Instant;
use tracing::{error, info, warn};

use super::guards::RequireKeyAuth;
use super::routes::{chat, gemini, messages, misc, models, responses};
use super::state::GatewayState;

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn generate_request_id() -> String {
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(generate_request_id);

    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = start.elapsed().as_millis() as u64;
    let path = uri.path();
    let protocol = format_http_version(version);

    // For SSE responses, latency_ms is time-to-first-byte, not full stream duration.
    let line = format!(
        "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
        status.as_u16(),
        request_id,
        method.as_str(),
        protocol,
        path,
        latency_ms,
        user_agent
    );

    if status.is_server_error() {
        error!("{line}");
    } else if status.is_client_error() {
        warn!("{line}");
    } else {
        info!("{line}");
    }

    resp
}

pub fn gateway_router(state: GatewayState) -> Router {
    let authenticated = Router::new()
        .route("/v1/chat/completions", post(chat::handler))
        .route("/v1/responses", post(responses::handler))
        .route("/v1/messages", post(messages::handler))
        .route("/v1/models", get(models::openai_list))
        .route("/v1beta/models", get(models::gemini_list))
        .route("/v1beta/models/{*path}", post(gemini::handler))
        .layer(middleware::from_extractor_with_state::<RequireKeyAuth, _>(
            state.clone(),
        ));

    let public = Router::new()
        .route("/", get(misc::root))
        .route("/health", get(misc::health));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .fallback(misc::not_found)
        .with_state(state)
        .layer(middleware::from_fn(access_log))
}
