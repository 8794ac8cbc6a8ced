//! Upstream dispatch (§4.1, §4.8): sends a translated envelope to Code
//! Assist and returns either the parsed unary body or a raw byte stream for
//! SSE translation.

use bytes::Bytes;
use futures::Stream;
use pollux_schema::geminicli::GeminiCliRequest;

use crate::error::{GatewayError, TransportError};
use crate::transport;

use super::state::GatewayState;

pub async fn send_unary(
    state: &GatewayState,
    action: &str,
    access_token: &str,
    envelope: &GeminiCliRequest,
) -> Result<Vec<u8>, GatewayError> {
    let url = state.upstream_url(action);
    let response = transport::retry_unary(&state.config.transport, || {
        state.http.post(&url).bearer_auth(access_token).json(envelope).send()
    })
    .await?;

    let body = response.bytes().await.map_err(TransportError::Reqwest)?;
    Ok(body.to_vec())
}

pub async fn send_stream(
    state: &GatewayState,
    action: &str,
    access_token: &str,
    envelope: &GeminiCliRequest,
) -> Result<impl Stream<Item = Result<Bytes, reqwest::Error>> + use<>, GatewayError> {
    let url = format!("{}?alt=sse", state.upstream_url(action));
    let response = transport::retry_unary(&state.config.transport, || {
        state.http.post(&url).bearer_auth(access_token).json(envelope).send()
    })
    .await?;

    Ok(response.bytes_stream())
}
