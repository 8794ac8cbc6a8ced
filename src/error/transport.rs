use axum::http::StatusCode;
use thiserror::Error as ThisError;

use super::IsRetryable;

/// Errors from the upstream HTTP transport (§4.8).
#[derive(Debug, ThisError)]
pub enum TransportError {
    #[error("upstream request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {body:.300}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("upstream stream protocol error: {0}")]
    StreamProtocol(String),

    #[error("request was cancelled by the downstream client")]
    Cancelled,
}

const RETRYABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

impl TransportError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::UpstreamStatus { status, .. } => Some(*status),
            TransportError::Reqwest(e) => e.status().map(|s| {
                StatusCode::from_u16(s.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY)
            }),
            _ => None,
        }
    }
}

impl IsRetryable for TransportError {
    fn is_retryable(&self) -> bool {
        match self {
            TransportError::Reqwest(e) => {
                e.is_connect() || e.is_timeout() || e.is_request() || e.is_body()
            }
            TransportError::UpstreamStatus { status, .. } => RETRYABLE_STATUSES.contains(status),
            TransportError::StreamProtocol(_) | TransportError::Cancelled => false,
        }
    }
}
