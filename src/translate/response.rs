//! Unary response translation: upstream Code Assist JSON → per-schema
//! response bodies (§4.9).

use serde_json::{Value, json};

use pollux_schema::anthropic::{AnthropicMessagesResponse, AnthropicResponseBlock, AnthropicUsage};
use pollux_schema::gemini::{Candidate, GeminiResponseBody, Part};
use pollux_schema::geminicli::GeminiCliResponseBody;
use pollux_schema::openai::{ChatChoice, ChatCompletionResponse, ChatResponseMessage, ChatUsage};

use crate::error::TranslateError;

/// Parses an upstream unary body, accepting both the `{ response: {…} }`
/// wrapping used by the Code Assist envelope and the bare candidate form.
pub fn parse_upstream_unary(body: &[u8]) -> Result<GeminiResponseBody, TranslateError> {
    if let Ok(wrapped) = serde_json::from_slice::<GeminiCliResponseBody>(body) {
        return Ok(wrapped.into());
    }
    serde_json::from_slice::<GeminiResponseBody>(body)
        .map_err(|e| TranslateError::invalid(format!("malformed upstream response: {e}")))
}

pub fn map_finish_reason(reason: Option<&str>, has_function_call: bool) -> Option<String> {
    if has_function_call {
        return Some("tool_calls".to_string());
    }
    match reason {
        Some("STOP") => Some("stop".to_string()),
        Some("MAX_TOKENS") => Some("length".to_string()),
        Some("SAFETY") | Some("RECITATION") => Some("content_filter".to_string()),
        Some(other) => Some(other.to_lowercase()),
        None => None,
    }
}

/// Extracted text/reasoning/tool-call content of a single candidate,
/// schema-agnostic.
struct CandidateContent {
    text: String,
    reasoning: String,
    tool_calls: Vec<Value>,
    has_function_call: bool,
}

fn extract_candidate(candidate: &Candidate) -> CandidateContent {
    let mut text = String::new();
    let mut reasoning = String::new();
    let mut tool_calls = Vec::new();

    if let Some(content) = &candidate.content {
        for part in &content.parts {
            append_part(part, &mut text, &mut reasoning, &mut tool_calls);
        }
    }

    CandidateContent {
        text,
        reasoning,
        has_function_call: !tool_calls.is_empty(),
        tool_calls,
    }
}

fn append_part(part: &Part, text: &mut String, reasoning: &mut String, tool_calls: &mut Vec<Value>) {
    if let Some(call) = &part.function_call {
        tool_calls.push(json!({
            "id": format!("call_{}", tool_calls.len()),
            "type": "function",
            "function": {
                "name": call.get("name").cloned().unwrap_or(Value::Null),
                "arguments": call.get("args").map(|a| a.to_string()).unwrap_or_default(),
            }
        }));
        return;
    }

    if let Some(inline) = &part.inline_data {
        let mime = inline.get("mimeType").and_then(Value::as_str).unwrap_or("image/png");
        let data = inline.get("data").and_then(Value::as_str).unwrap_or_default();
        text.push_str(&format!("![image](data:{mime};base64,{data})"));
        return;
    }

    let Some(part_text) = &part.text else { return };
    if part.thought == Some(true) {
        reasoning.push_str(part_text);
    } else {
        text.push_str(part_text);
    }
}

pub fn to_openai_chat(response: &GeminiResponseBody, model: &str) -> ChatCompletionResponse {
    let choices = response
        .candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let extracted = extract_candidate(candidate);
            ChatChoice {
                index: index as u32,
                message: ChatResponseMessage {
                    role: "assistant".to_string(),
                    content: if extracted.text.is_empty() { None } else { Some(extracted.text) },
                    reasoning_content: if extracted.reasoning.is_empty() { None } else { Some(extracted.reasoning) },
                    tool_calls: if extracted.tool_calls.is_empty() { None } else { Some(extracted.tool_calls) },
                },
                finish_reason: map_finish_reason(candidate.finish_reason.as_deref(), extracted.has_function_call),
            }
        })
        .collect();

    ChatCompletionResponse {
        id: format!("chatcmpl-{}", response.responseId.clone().unwrap_or_default()),
        object: "chat.completion".to_string(),
        created: 0,
        model: model.to_string(),
        choices,
        usage: response.usageMetadata.as_ref().map(usage_from_metadata),
        extra: Default::default(),
    }
}

fn usage_from_metadata(metadata: &Value) -> ChatUsage {
    ChatUsage {
        prompt_tokens: metadata.get("promptTokenCount").and_then(Value::as_u64).unwrap_or(0) as u32,
        completion_tokens: metadata.get("candidatesTokenCount").and_then(Value::as_u64).unwrap_or(0) as u32,
        total_tokens: metadata.get("totalTokenCount").and_then(Value::as_u64).unwrap_or(0) as u32,
    }
}

pub fn to_anthropic(response: &GeminiResponseBody, model: &str) -> AnthropicMessagesResponse {
    let candidate = response.candidates.first();
    let mut blocks = Vec::new();
    let mut stop_reason = None;
    let mut has_function_call = false;

    if let Some(candidate) = candidate {
        let extracted = extract_candidate(candidate);
        has_function_call = extracted.has_function_call;
        if !extracted.reasoning.is_empty() {
            blocks.push(AnthropicResponseBlock {
                r#type: "thinking".to_string(),
                text: None,
                thinking: Some(extracted.reasoning),
                id: None,
                name: None,
                input: None,
            });
        }
        if !extracted.text.is_empty() {
            blocks.push(AnthropicResponseBlock {
                r#type: "text".to_string(),
                text: Some(extracted.text),
                thinking: None,
                id: None,
                name: None,
                input: None,
            });
        }
        for call in &extracted.tool_calls {
            blocks.push(AnthropicResponseBlock {
                r#type: "tool_use".to_string(),
                text: None,
                thinking: None,
                id: call.get("id").and_then(Value::as_str).map(str::to_string),
                name: call
                    .get("function")
                    .and_then(|f| f.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                input: call
                    .get("function")
                    .and_then(|f| f.get("arguments"))
                    .and_then(Value::as_str)
                    .and_then(|s| serde_json::from_str(s).ok()),
            });
        }

        stop_reason = map_finish_reason(candidate.finish_reason.as_deref(), has_function_call)
            .map(|r| match r.as_str() {
                "stop" => "end_turn".to_string(),
                "length" => "max_tokens".to_string(),
                "content_filter" => "end_turn".to_string(),
                "tool_calls" => "tool_use".to_string(),
                other => other.to_string(),
            });
    }

    AnthropicMessagesResponse {
        id: format!("msg_{}", response.responseId.clone().unwrap_or_default()),
        r#type: "message".to_string(),
        role: "assistant".to_string(),
        content: blocks,
        model: model.to_string(),
        stop_reason,
        stop_sequence: None,
        usage: response
            .usageMetadata
            .as_ref()
            .map(|m| AnthropicUsage {
                input_tokens: m.get("promptTokenCount").and_then(Value::as_u64).unwrap_or(0) as u32,
                output_tokens: m.get("candidatesTokenCount").and_then(Value::as_u64).unwrap_or(0) as u32,
            })
            .unwrap_or_default(),
        extra: Default::default(),
    }
}

/// The OpenAI Responses API has no dedicated schema type in this crate yet;
/// the unary response is built directly as JSON.
pub fn to_openai_responses(response: &GeminiResponseBody, model: &str) -> Value {
    let candidate = response.candidates.first();
    let mut output = Vec::new();

    if let Some(candidate) = candidate {
        let extracted = extract_candidate(candidate);
        let mut content = Vec::new();
        if !extracted.text.is_empty() {
            content.push(json!({"type": "output_text", "text": extracted.text}));
        }
        if !content.is_empty() {
            output.push(json!({
                "type": "message",
                "role": "assistant",
                "content": content,
            }));
        }
        for call in &extracted.tool_calls {
            output.push(json!({
                "type": "function_call",
                "name": call.get("function").and_then(|f| f.get("name")),
                "arguments": call.get("function").and_then(|f| f.get("arguments")),
                "call_id": call.get("id"),
            }));
        }
    }

    json!({
        "id": format!("resp_{}", response.responseId.clone().unwrap_or_default()),
        "object": "response",
        "model": model,
        "output": output,
        "usage": response.usageMetadata,
    })
}

pub fn to_native(response: GeminiResponseBody) -> GeminiResponseBody {
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_body() -> GeminiResponseBody {
        serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "hello"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap()
    }

    #[test]
    fn wrapped_response_unwraps() {
        let raw = json!({"response": {"candidates": []}}).to_string();
        let parsed = parse_upstream_unary(raw.as_bytes()).unwrap();
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn bare_response_parses() {
        let raw = json!({"candidates": []}).to_string();
        let parsed = parse_upstream_unary(raw.as_bytes()).unwrap();
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn openai_chat_maps_stop_to_stop() {
        let chat = to_openai_chat(&sample_body(), "gemini-2.5-pro");
        assert_eq!(chat.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(chat.choices[0].message.content.as_deref(), Some("hello"));
    }

    #[test]
    fn function_call_forces_tool_calls_reason() {
        let body: GeminiResponseBody = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"functionCall": {"name": "f", "args": {}}}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        let chat = to_openai_chat(&body, "gemini-2.5-pro");
        assert_eq!(chat.choices[0].finish_reason.as_deref(), Some("tool_calls"));
    }

    #[test]
    fn anthropic_maps_stop_to_end_turn() {
        let message = to_anthropic(&sample_body(), "gemini-2.5-pro");
        assert_eq!(message.stop_reason.as_deref(), Some("end_turn"));
        assert_eq!(message.content[0].text.as_deref(), Some("hello"));
    }

    #[test]
    fn anthropic_maps_safety_block_to_end_turn_not_stop_sequence() {
        let body: GeminiResponseBody = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "partial"}]},
                "finishReason": "SAFETY"
            }]
        }))
        .unwrap();
        let message = to_anthropic(&body, "gemini-2.5-pro");
        assert_eq!(message.stop_reason.as_deref(), Some("end_turn"));
    }
}
