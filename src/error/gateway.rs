use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pollux_schema::anthropic::{AnthropicErrorBody, AnthropicErrorObject};
use pollux_schema::openai::{OpenaiErrorBody, OpenaiErrorObject};
use serde_json::{Value, json};

use super::{CredentialError, TransportError, TranslateError};

/// Which public schema a given request/response belongs to. The dispatcher
/// resolves this before parsing the body and carries it alongside the
/// in-flight request so errors can be formatted back in the caller's shape
/// (§7: "formatted per the caller's schema").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    OpenaiChat,
    OpenaiResponses,
    Anthropic,
    Native,
}

/// Top-level gateway error (§7). Every fallible dispatcher-facing operation
/// returns one of these; it is the only type turned into an HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error(transparent)]
    InvalidRequest(#[from] TranslateError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn internal(message: impl Into<String>) -> Self {
        GatewayError::Internal(message.into())
    }

    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            GatewayError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "invalid API key".to_string())
            }
            GatewayError::InvalidRequest(TranslateError::InvalidRequest(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            GatewayError::Credential(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            GatewayError::Transport(e) => match e.status() {
                Some(status) if status.is_client_error() => (status, e.to_string()),
                Some(_) => (StatusCode::BAD_GATEWAY, e.to_string()),
                None => (StatusCode::BAD_GATEWAY, e.to_string()),
            },
            GatewayError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        }
    }

    /// Formats this error as an HTTP response shaped for `schema`, logging at
    /// `warn` (caller-caused) or `error` (internal) first, per §4.1/§7.
    pub fn into_response(self, schema: Schema) -> Response {
        let (status, body) = self.error_body(schema);
        (status, Json(body)).into_response()
    }

    /// Builds the `(status, body)` pair for `schema`, logging at `warn`
    /// (caller-caused) or `error` (internal) first. Shared by the unary
    /// error response path above and by the SSE translator, which needs the
    /// same per-schema shape for a mid-stream failure (§4.9, §7).
    pub fn error_body(&self, schema: Schema) -> (StatusCode, Value) {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "gateway error");
        } else {
            tracing::warn!(status = %status, error = %self, "gateway error");
        }

        let body = match schema {
            Schema::OpenaiChat | Schema::OpenaiResponses => {
                let r#type = match status {
                    StatusCode::UNAUTHORIZED => "authentication_error",
                    StatusCode::BAD_REQUEST => "invalid_request_error",
                    _ => "api_error",
                };
                serde_json::to_value(OpenaiErrorBody {
                    inner: OpenaiErrorObject {
                        message,
                        r#type: r#type.to_string(),
                        code: None,
                        param: None,
                    },
                })
                .expect("openai error body serializes")
            }
            Schema::Anthropic => {
                let r#type = match status {
                    StatusCode::UNAUTHORIZED => "authentication_error",
                    StatusCode::BAD_REQUEST => "invalid_request_error",
                    _ => "api_error",
                };
                serde_json::to_value(AnthropicErrorBody::new(r#type, message))
                    .expect("anthropic error body serializes")
            }
            Schema::Native => json!({
                "error": { "message": message, "status": status.as_u16() }
            }),
        };

        (status, body)
    }
}

/// `WWW-Authenticate: Basic` is required on auth failures (§4.1 S1); axum
/// extractors reject before a schema is known, so unauthenticated responses
/// are always formatted as the bare native shape with that header attached.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let unauthenticated = matches!(self, GatewayError::Unauthenticated);
        let mut resp = GatewayError::into_response(self, Schema::Native);
        if unauthenticated {
            resp.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Basic"),
            );
        }
        resp
    }
}
