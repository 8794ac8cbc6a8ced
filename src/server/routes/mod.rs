//! Per-endpoint HTTP handlers (§6). Each handler extracts and logs the
//! caller's body, dispatches to upstream through [`crate::server::dispatch`],
//! and formats the result back through [`crate::translate`].

pub mod chat;
pub mod gemini;
pub mod messages;
pub mod misc;
pub mod models;
pub mod responses;

use std::time::Duration;

use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::error;

use crate::error::TransportError;
use crate::translate::sse::{SseSchema, translate_stream};

/// Wraps a translated upstream byte stream into an SSE response, applying
/// the same 60-second idle timeout the official client enforces (§4.9).
pub(super) fn sse_response<S, E>(upstream: S, schema: SseSchema, model: String) -> Response
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let events = translate_stream(upstream, schema, model)
        .timeout(Duration::from_secs(60))
        .map(|item| match item {
            Ok(Ok(event)) => Ok(event),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                error!("upstream SSE stream timed out (idle > 60s)");
                Err(TransportError::StreamProtocol("stream idle timeout".to_string()))
            }
        });

    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}
