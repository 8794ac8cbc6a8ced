//! Shared-secret auth guard (§4.1 S1): the caller is accepted iff one of
//! the `key` query parameter, the `x-goog-api-key` header, a `Bearer` token
//! in `Authorization`, or the password half of `Basic` credentials equals
//! the configured secret, compared in constant time.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::{Basic, Bearer};
use axum_extra::headers::{Authorization, HeaderMapExt};
use subtle::ConstantTimeEq;

use crate::error::GatewayError;
use crate::server::state::GatewayState;

#[derive(Debug, Clone, Copy)]
pub struct RequireKeyAuth;

impl FromRequestParts<GatewayState> for RequireKeyAuth {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GatewayState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.config.auth_password.as_str();
        let candidate = extract_header_token(&parts.headers)
            .or_else(|| extract_query_token(parts.uri.query()));

        match candidate {
            Some(value) if constant_time_eq(value.as_bytes(), expected.as_bytes()) => {
                Ok(RequireKeyAuth)
            }
            _ => Err(GatewayError::Unauthenticated),
        }
    }
}

fn extract_header_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(key) = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) {
        return Some(key.to_string());
    }
    if let Some(auth) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(auth.token().to_string());
    }
    if let Some(auth) = headers.typed_get::<Authorization<Basic>>() {
        return Some(auth.password().to_string());
    }
    None
}

fn extract_query_token(query: Option<&str>) -> Option<String> {
    query.and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k == "key")
            .map(|(_, v)| v.into_owned())
    })
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    !b.is_empty() && a.len() == b.len() && bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_when_lengths_differ() {
        assert!(!constant_time_eq(b"short", b"longer-secret"));
    }

    #[test]
    fn rejects_empty_configured_secret() {
        assert!(!constant_time_eq(b"", b""));
    }

    #[test]
    fn accepts_matching_secret() {
        assert!(constant_time_eq(b"shared-secret", b"shared-secret"));
    }
}
