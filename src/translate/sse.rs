//! Streaming response translation (§4.9): upstream Code Assist SSE frames →
//! per-schema SSE events, order-preserving.

use axum::response::sse::Event;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use serde_json::{Value, json};
use tracing::warn;

use pollux_schema::gemini::GeminiResponseBody;
use pollux_schema::geminicli::GeminiCliResponseBody;

use crate::error::{GatewayError, Schema, TransportError};

use super::response::map_finish_reason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseSchema {
    OpenaiChat,
    OpenaiResponses,
    Anthropic,
    Native,
}

/// Converts a byte stream carrying upstream `data: {response: {...}}` SSE
/// frames into axum SSE events for the caller's schema. Non-`data:` lines
/// and frames that fail to parse are skipped, never terminate the stream
/// (§4.9 step 1).
pub fn translate_stream<S, E>(
    upstream: S,
    schema: SseSchema,
    model: String,
) -> impl Stream<Item = Result<Event, TransportError>>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let frames = upstream.eventsource().filter_map(|item| async move {
        match item {
            Ok(event) => {
                if event.data.is_empty() {
                    return None;
                }
                match serde_json::from_str::<GeminiCliResponseBody>(&event.data) {
                    Ok(wrapped) => Some(Ok::<_, TransportError>(GeminiResponseBody::from(wrapped))),
                    Err(_) => {
                        warn!(preview = %event.data.chars().take(80).collect::<String>(), "skipping unparseable SSE frame");
                        None
                    }
                }
            }
            Err(e) => Some(Err(TransportError::StreamProtocol(e.to_string()))),
        }
    });

    let mut state = StreamState::new(schema);
    let body = frames.flat_map(move |frame| {
        let events = match frame {
            Ok(frame) => encode_frame(&mut state, &frame, &model)
                .into_iter()
                .map(Ok)
                .collect::<Vec<_>>(),
            Err(e) => vec![Err(e)],
        };
        futures::stream::iter(events)
    });

    // A mid-stream failure is terminal (§4.9): once an `Err` frame is seen,
    // swap it for a schema-formatted error event and stop reading further
    // upstream frames, instead of following it with the success terminator.
    let errored = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let errored_in_scan = errored.clone();
    let mut stopped = false;
    let body = body.scan((), move |_state, item| {
        if stopped {
            return futures::future::ready(None);
        }
        match item {
            Ok(event) => futures::future::ready(Some(Ok(event))),
            Err(e) => {
                stopped = true;
                errored_in_scan.store(true, std::sync::atomic::Ordering::Relaxed);
                futures::future::ready(Some(Ok(error_event(schema, e))))
            }
        }
    });

    let tail = futures::stream::once(async move {
        if errored.load(std::sync::atomic::Ordering::Relaxed) {
            None
        } else {
            Some(Ok(terminal_event(schema)))
        }
    })
    .filter_map(|item| async move { item });

    body.chain(tail)
}

/// Formats an upstream failure as the equivalent of [`GatewayError::error_body`],
/// carried as an SSE event instead of an HTTP response body (§4.9, §7).
fn error_event(schema: SseSchema, error: TransportError) -> Event {
    let gateway_schema = match schema {
        SseSchema::OpenaiChat => Schema::OpenaiChat,
        SseSchema::OpenaiResponses => Schema::OpenaiResponses,
        SseSchema::Anthropic => Schema::Anthropic,
        SseSchema::Native => Schema::Native,
    };
    let (_, body) = GatewayError::from(error).error_body(gateway_schema);

    match schema {
        SseSchema::OpenaiChat | SseSchema::Native => {
            Event::default().json_data(body).expect("error body serializes")
        }
        SseSchema::OpenaiResponses => Event::default()
            .event("response.failed")
            .json_data(body)
            .expect("error body serializes"),
        SseSchema::Anthropic => Event::default()
            .event("error")
            .json_data(body)
            .expect("error body serializes"),
    }
}

struct StreamState {
    schema: SseSchema,
    sent_start: bool,
    content_block_open: bool,
    chunk_index: u64,
}

impl StreamState {
    fn new(schema: SseSchema) -> Self {
        StreamState {
            schema,
            sent_start: false,
            content_block_open: false,
            chunk_index: 0,
        }
    }
}

fn encode_frame(state: &mut StreamState, frame: &GeminiResponseBody, model: &str) -> Vec<Event> {
    match state.schema {
        SseSchema::OpenaiChat => encode_openai_chat(state, frame, model),
        SseSchema::OpenaiResponses => encode_openai_responses(state, frame, model),
        SseSchema::Anthropic => encode_anthropic(state, frame, model),
        SseSchema::Native => vec![Event::default().json_data(frame).expect("gemini frame serializes")],
    }
}

fn frame_parts(frame: &GeminiResponseBody) -> (String, String, Vec<Value>, Option<String>) {
    let mut text = String::new();
    let mut reasoning = String::new();
    let mut tool_calls = Vec::new();
    let mut finish_reason = None;

    if let Some(candidate) = frame.candidates.first() {
        if let Some(content) = &candidate.content {
            for part in &content.parts {
                if let Some(call) = &part.function_call {
                    tool_calls.push(json!({
                        "id": format!("call_{}", tool_calls.len()),
                        "type": "function",
                        "function": {
                            "name": call.get("name").cloned().unwrap_or(Value::Null),
                            "arguments": call.get("args").map(|a| a.to_string()).unwrap_or_default(),
                        }
                    }));
                } else if let Some(t) = &part.text {
                    if part.thought == Some(true) {
                        reasoning.push_str(t);
                    } else {
                        text.push_str(t);
                    }
                }
            }
        }
        finish_reason = map_finish_reason(candidate.finish_reason.as_deref(), !tool_calls.is_empty());
    }

    (text, reasoning, tool_calls, finish_reason)
}

fn encode_openai_chat(state: &mut StreamState, frame: &GeminiResponseBody, model: &str) -> Vec<Event> {
    let (text, reasoning, tool_calls, finish_reason) = frame_parts(frame);
    state.chunk_index += 1;

    let mut delta = json!({});
    if !state.sent_start {
        delta["role"] = json!("assistant");
        state.sent_start = true;
    }
    if !text.is_empty() {
        delta["content"] = json!(text);
    }
    if !reasoning.is_empty() {
        delta["reasoning_content"] = json!(reasoning);
    }
    if !tool_calls.is_empty() {
        delta["tool_calls"] = json!(tool_calls);
    }

    let chunk = json!({
        "id": format!("chatcmpl-{}", state.chunk_index),
        "object": "chat.completion.chunk",
        "created": 0,
        "model": model,
        "choices": [{
            "index": 0,
            "delta": delta,
            "finish_reason": finish_reason,
        }],
    });

    vec![Event::default().json_data(chunk).expect("chunk serializes")]
}

fn encode_openai_responses(state: &mut StreamState, frame: &GeminiResponseBody, model: &str) -> Vec<Event> {
    let (text, _reasoning, tool_calls, _finish_reason) = frame_parts(frame);
    let mut events = Vec::new();

    if !state.sent_start {
        state.sent_start = true;
        events.push(
            Event::default()
                .event("response.created")
                .json_data(json!({"type": "response.created", "response": {"model": model}}))
                .expect("event serializes"),
        );
    }

    if !text.is_empty() {
        events.push(
            Event::default()
                .event("response.output_text.delta")
                .json_data(json!({"type": "response.output_text.delta", "delta": text}))
                .expect("event serializes"),
        );
    }

    for call in tool_calls {
        events.push(
            Event::default()
                .event("response.function_call_arguments.done")
                .json_data(json!({"type": "response.function_call_arguments.done", "call": call}))
                .expect("event serializes"),
        );
    }

    events
}

fn encode_anthropic(state: &mut StreamState, frame: &GeminiResponseBody, model: &str) -> Vec<Event> {
    let (text, reasoning, tool_calls, _finish_reason) = frame_parts(frame);
    let mut events = Vec::new();

    if !state.sent_start {
        state.sent_start = true;
        events.push(
            Event::default()
                .event("message_start")
                .json_data(json!({
                    "type": "message_start",
                    "message": {
                        "id": "msg_stream",
                        "type": "message",
                        "role": "assistant",
                        "model": model,
                        "content": [],
                    }
                }))
                .expect("event serializes"),
        );
    }

    if !reasoning.is_empty() {
        if !state.content_block_open {
            events.push(open_content_block(0, "thinking"));
            state.content_block_open = true;
        }
        events.push(content_block_delta(0, json!({"type": "thinking_delta", "thinking": reasoning})));
    }

    if !text.is_empty() {
        if !state.content_block_open {
            events.push(open_content_block(0, "text"));
            state.content_block_open = true;
        }
        events.push(content_block_delta(0, json!({"type": "text_delta", "text": text})));
    }

    for call in tool_calls {
        events.push(
            Event::default()
                .event("content_block_start")
                .json_data(json!({
                    "type": "content_block_start",
                    "index": 1,
                    "content_block": {
                        "type": "tool_use",
                        "id": call.get("id"),
                        "name": call.get("function").and_then(|f| f.get("name")),
                        "input": call.get("function").and_then(|f| f.get("arguments")),
                    }
                }))
                .expect("event serializes"),
        );
    }

    events
}

fn open_content_block(index: u32, kind: &str) -> Event {
    Event::default()
        .event("content_block_start")
        .json_data(json!({
            "type": "content_block_start",
            "index": index,
            "content_block": {"type": kind},
        }))
        .expect("event serializes")
}

fn content_block_delta(index: u32, delta: Value) -> Event {
    Event::default()
        .event("content_block_delta")
        .json_data(json!({"type": "content_block_delta", "index": index, "delta": delta}))
        .expect("event serializes")
}

fn terminal_event(schema: SseSchema) -> Event {
    match schema {
        SseSchema::OpenaiChat => Event::default().data("[DONE]"),
        SseSchema::OpenaiResponses => Event::default()
            .event("response.completed")
            .json_data(json!({"type": "response.completed"}))
            .expect("event serializes"),
        SseSchema::Anthropic => Event::default()
            .event("message_stop")
            .json_data(json!({"type": "message_stop"}))
            .expect("event serializes"),
        SseSchema::Native => Event::default().data(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str, finish: Option<&str>) -> GeminiResponseBody {
        let mut value = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
            }]
        });
        if let Some(finish) = finish {
            value["candidates"][0]["finishReason"] = json!(finish);
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn first_openai_chunk_carries_role() {
        let mut state = StreamState::new(SseSchema::OpenaiChat);
        let events = encode_openai_chat(&mut state, &frame("hi", None), "gemini-2.5-pro");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn anthropic_opens_content_block_once() {
        let mut state = StreamState::new(SseSchema::Anthropic);
        let first = encode_anthropic(&mut state, &frame("a", None), "gemini-2.5-pro");
        let second = encode_anthropic(&mut state, &frame("b", None), "gemini-2.5-pro");
        assert!(first.len() >= 2);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn function_call_sets_tool_use_block_for_anthropic() {
        let frame: GeminiResponseBody = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"functionCall": {"name": "f", "args": {}}}]},
            }]
        }))
        .unwrap();
        let mut state = StreamState::new(SseSchema::Anthropic);
        let events = encode_anthropic(&mut state, &frame, "gemini-2.5-pro");
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn mid_stream_failure_closes_with_error_event_not_success_terminal() {
        let chunks: Vec<Result<bytes::Bytes, std::io::Error>> = vec![
            Ok(bytes::Bytes::from_static(
                b"data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"hi\"}]}}]}\n\n",
            )),
            Err(std::io::Error::other("boom")),
        ];
        let upstream = futures::stream::iter(chunks);

        let events: Vec<_> = translate_stream(upstream, SseSchema::OpenaiChat, "m".to_string())
            .collect()
            .await;

        assert!(
            events.iter().all(Result::is_ok),
            "a mid-stream failure must be converted to an Ok error event, never left as a raw Err"
        );
        // one content chunk, one error event, no `[DONE]` success terminator after it
        assert_eq!(events.len(), 2);
    }
}
