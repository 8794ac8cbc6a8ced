//! OpenAI Chat Completions → upstream translator (§4.7).

use serde_json::{Value, json};

use pollux_schema::gemini::{Content, GeminiGenerateContentRequest, GenerationConfig, Part};
use pollux_schema::geminicli::GeminiCliRequest;
use pollux_schema::openai::{
    ChatCompletionRequestBody, ChatMessage, ContentPart, MessageContent, StopSequences,
};

use crate::error::TranslateError;

use super::envelope;
use super::markdown_images::split_markdown_images;

/// Translates a Chat Completions body into the upstream envelope. Pure:
/// no IO, no shared state (§4.7).
pub fn translate(
    body: &ChatCompletionRequestBody,
    project: String,
) -> Result<GeminiCliRequest, TranslateError> {
    if body.messages.is_empty() {
        return Err(TranslateError::invalid("messages must not be empty"));
    }

    let mut contents = Vec::new();
    let mut system_parts: Vec<Part> = Vec::new();

    for message in &body.messages {
        match message.role.as_str() {
            "system" => system_parts.extend(text_to_parts(&message.text_only())),
            "assistant" => contents.push(Content {
                role: Some("model".to_string()),
                parts: message_to_parts(message)?,
                extra: Default::default(),
            }),
            "tool" => {
                let name = message
                    .tool_call_id
                    .clone()
                    .or_else(|| message.name.clone())
                    .unwrap_or_default();
                contents.push(Content {
                    role: Some("user".to_string()),
                    parts: vec![function_response_part(&name, &message.text_only())],
                    extra: Default::default(),
                });
            }
            _ => contents.push(Content {
                role: Some("user".to_string()),
                parts: message_to_parts(message)?,
                extra: Default::default(),
            }),
        }
    }

    let system_instruction = if system_parts.is_empty() {
        None
    } else {
        Some(Content {
            role: None,
            parts: system_parts,
            extra: Default::default(),
        })
    };

    let variant = envelope::resolve_variant(&body.model);
    let has_explicit_thinking_suffix = envelope::has_thinking_variant_suffix(&body.model);
    let generation_config = build_generation_config(body, &variant.base_name, has_explicit_thinking_suffix);
    let (tools, tool_config) = build_tools(body)?;

    let request = GeminiGenerateContentRequest {
        contents,
        system_instruction,
        generation_config: Some(generation_config),
        tools,
        tool_config,
        extra: Default::default(),
    };

    // Explicit thinking-variant suffixes (§4.6) fix their own budget and
    // ignore reasoning_effort entirely, so the caller never "set" one here.
    let caller_set_budget = body.reasoning_effort.is_some() && !has_explicit_thinking_suffix;
    Ok(envelope::finalize(request, &variant, project, caller_set_budget))
}

fn message_to_parts(message: &ChatMessage) -> Result<Vec<Part>, TranslateError> {
    match &message.content {
        None => Ok(vec![]),
        Some(MessageContent::Text(text)) => Ok(text_to_parts(text)),
        Some(MessageContent::Parts(parts)) => {
            let mut out = Vec::new();
            for part in parts {
                out.push(content_part_to_part(part)?);
            }
            Ok(out)
        }
    }
}

fn content_part_to_part(part: &ContentPart) -> Result<Part, TranslateError> {
    match part.r#type.as_str() {
        "text" => Ok(text_part(part.text.as_deref().unwrap_or_default())),
        "image_url" => {
            let url = part
                .image_url
                .as_ref()
                .map(|i| i.url.as_str())
                .ok_or_else(|| TranslateError::invalid("image_url part missing url"))?;
            Ok(image_url_to_part(url))
        }
        other => Err(TranslateError::invalid(format!(
            "unsupported content part type: {other}"
        ))),
    }
}

fn image_url_to_part(url: &str) -> Part {
    if let Some((mime, data)) = parse_data_uri(url) {
        Part {
            inline_data: Some(json!({"mimeType": mime, "data": data})),
            ..Default::default()
        }
    } else {
        text_part(url)
    }
}

fn parse_data_uri(url: &str) -> Option<(String, String)> {
    let rest = url.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime.to_string(), data.to_string()))
}

/// Splits string content on Markdown image syntax, turning embedded data
/// URIs into inline parts and leaving surrounding text as text parts (§4.7).
fn text_to_parts(text: &str) -> Vec<Part> {
    split_markdown_images(text)
        .into_iter()
        .filter_map(|segment| match segment {
            super::markdown_images::Segment::Text(t) if !t.is_empty() => Some(text_part(&t)),
            super::markdown_images::Segment::Text(_) => None,
            super::markdown_images::Segment::ImageUri(uri) => Some(image_url_to_part(&uri)),
        })
        .collect()
}

fn text_part(text: &str) -> Part {
    Part {
        text: Some(text.to_string()),
        ..Default::default()
    }
}

fn function_response_part(name: &str, response_text: &str) -> Part {
    let response: Value =
        serde_json::from_str(response_text).unwrap_or_else(|_| json!({"result": response_text}));
    Part {
        function_response: Some(json!({"name": name, "response": response})),
        ..Default::default()
    }
}

fn build_generation_config(
    body: &ChatCompletionRequestBody,
    base_model: &str,
    has_explicit_thinking_suffix: bool,
) -> GenerationConfig {
    let mut config = GenerationConfig::default();
    config.temperature = body.temperature.map(f64::from);
    config.top_p = body.top_p.map(f64::from);
    config.max_output_tokens = body.max_tokens.or(body.max_completion_tokens);

    if let Some(stop) = &body.stop {
        let sequences = match stop {
            StopSequences::One(s) => vec![s.clone()],
            StopSequences::Many(v) => v.clone(),
        };
        config.extra.insert("stopSequences".to_string(), json!(sequences));
    }
    if let Some(fp) = body.frequency_penalty {
        config.extra.insert("frequencyPenalty".to_string(), json!(fp));
    }
    if let Some(pp) = body.presence_penalty {
        config.extra.insert("presencePenalty".to_string(), json!(pp));
    }
    if let Some(n) = body.n {
        config.extra.insert("candidateCount".to_string(), json!(n));
    }
    if let Some(seed) = body.seed {
        config.extra.insert("seed".to_string(), json!(seed));
    }
    if let Some(format) = &body.response_format {
        if format.r#type == "json_object" {
            config
                .extra
                .insert("responseMimeType".to_string(), json!("application/json"));
        }
    }
    if !has_explicit_thinking_suffix {
        if let Some(effort) = &body.reasoning_effort {
            if let Some(budget) = reasoning_effort_to_budget(effort, base_model) {
                *config.thinking_config_mut() = Some(json!({"thinkingBudget": budget, "includeThoughts": true}));
            }
        }
    }

    config
}

/// Per-base thinking budgets for each `reasoning_effort` level (§4.6).
/// `None` means no base in the table matches, in which case no override is
/// emitted and the model falls back to its own default thinking behavior.
fn reasoning_effort_to_budget(effort: &str, base_model: &str) -> Option<i64> {
    match effort {
        "minimal" => {
            if base_model.contains("gemini-2.5-flash") {
                Some(0)
            } else if base_model.contains("gemini-2.5-pro") || base_model.contains("gemini-3-pro") {
                Some(128)
            } else {
                None
            }
        }
        "low" => Some(1000),
        "medium" => Some(-1),
        "high" => {
            if base_model.contains("gemini-2.5-flash") {
                Some(24_576)
            } else if base_model.contains("gemini-2.5-pro") {
                Some(32_768)
            } else if base_model.contains("gemini-3-pro") {
                Some(45_000)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn build_tools(
    body: &ChatCompletionRequestBody,
) -> Result<
    (
        Option<Vec<pollux_schema::gemini::Tool>>,
        Option<pollux_schema::gemini::ToolConfig>,
    ),
    TranslateError,
> {
    let Some(tools) = &body.tools else {
        return Ok((None, None));
    };

    let declarations = tools
        .iter()
        .map(|t| {
            serde_json::from_value::<pollux_schema::gemini::FunctionDeclaration>(json!({
                "name": t.function.name,
                "description": t.function.description.clone().unwrap_or_default(),
                "parameters": t.function.parameters,
            }))
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TranslateError::invalid(format!("invalid tool declaration: {e}")))?;

    let gemini_tools = vec![serde_json::from_value(json!({"functionDeclarations": declarations}))
        .map_err(|e| TranslateError::invalid(e.to_string()))?];

    let tool_config = body.tool_choice.as_ref().map(|choice| {
        let mode_value = match choice {
            Value::String(s) if s == "none" => json!({"mode": "NONE"}),
            Value::String(s) if s == "required" => json!({"mode": "ANY"}),
            Value::String(_) => json!({"mode": "AUTO"}),
            Value::Object(obj) => {
                let name = obj
                    .get("function")
                    .and_then(|f| f.get("name"))
                    .and_then(Value::as_str);
                match name {
                    Some(n) => json!({"mode": "ANY", "allowedFunctionNames": [n]}),
                    None => json!({"mode": "AUTO"}),
                }
            }
            _ => json!({"mode": "AUTO"}),
        };
        serde_json::from_value(json!({"functionCallingConfig": mode_value}))
            .expect("tool config literal parses")
    });

    Ok((Some(gemini_tools), tool_config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(messages: Value) -> ChatCompletionRequestBody {
        serde_json::from_value(json!({
            "model": "gemini-2.5-pro",
            "messages": messages,
        }))
        .unwrap()
    }

    #[test]
    fn system_message_becomes_system_instruction() {
        let b = body(json!([
            {"role": "system", "content": "be terse"},
            {"role": "user", "content": "hi"}
        ]));
        let envelope = translate(&b, "proj".to_string()).unwrap();
        let instruction = envelope.request.system_instruction.unwrap();
        assert_eq!(instruction.parts[0].text.as_deref(), Some("be terse"));
    }

    #[test]
    fn assistant_role_maps_to_model() {
        let b = body(json!([
            {"role": "user", "content": "hi"},
            {"role": "assistant", "content": "hello"}
        ]));
        let envelope = translate(&b, "proj".to_string()).unwrap();
        assert_eq!(envelope.request.contents[1].role.as_deref(), Some("model"));
    }

    #[test]
    fn tool_role_becomes_function_response_user_turn() {
        let b = body(json!([
            {"role": "user", "content": "weather?"},
            {"role": "tool", "tool_call_id": "get_weather", "content": "{\"temp\": 72}"}
        ]));
        let envelope = translate(&b, "proj".to_string()).unwrap();
        let last = &envelope.request.contents[1];
        assert_eq!(last.role.as_deref(), Some("user"));
        assert!(last.parts[0].function_response.is_some());
    }

    #[test]
    fn image_data_uri_becomes_inline_data() {
        let b = body(json!([{
            "role": "user",
            "content": [
                {"type": "text", "text": "describe"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,abc123"}}
            ]
        }]));
        let envelope = translate(&b, "proj".to_string()).unwrap();
        let parts = &envelope.request.contents[0].parts;
        assert!(parts[1].inline_data.is_some());
    }

    #[test]
    fn empty_messages_rejected() {
        let b = body(json!([]));
        assert!(translate(&b, "proj".to_string()).is_err());
    }

    #[test]
    fn sampling_params_map_one_for_one() {
        let mut b = body(json!([{"role": "user", "content": "hi"}]));
        b.temperature = Some(0.5);
        b.top_p = Some(0.9);
        b.max_tokens = Some(100);
        b.stop = Some(StopSequences::One("STOP".to_string()));
        let envelope = translate(&b, "proj".to_string()).unwrap();
        let gc = envelope.request.generation_config.unwrap();
        assert_eq!(gc.temperature, Some(0.5));
        assert_eq!(gc.top_p, Some(0.9));
        assert_eq!(gc.max_output_tokens, Some(100));
        assert_eq!(gc.extra.get("stopSequences"), Some(&json!(["STOP"])));
    }

    #[test]
    fn reasoning_effort_high_varies_by_base_model() {
        let mut flash = body(json!([{"role": "user", "content": "hi"}]));
        flash.model = "gemini-2.5-flash".to_string();
        flash.reasoning_effort = Some("high".to_string());
        let envelope = translate(&flash, "proj".to_string()).unwrap();
        let thinking = envelope.request.generation_config.unwrap().thinking_config.unwrap();
        assert_eq!(thinking["thinkingBudget"], 24_576);

        let mut pro = body(json!([{"role": "user", "content": "hi"}]));
        pro.model = "gemini-2.5-pro".to_string();
        pro.reasoning_effort = Some("high".to_string());
        let envelope = translate(&pro, "proj".to_string()).unwrap();
        let thinking = envelope.request.generation_config.unwrap().thinking_config.unwrap();
        assert_eq!(thinking["thinkingBudget"], 32_768);
    }

    #[test]
    fn reasoning_effort_medium_is_model_default_not_fixed_budget() {
        let mut b = body(json!([{"role": "user", "content": "hi"}]));
        b.reasoning_effort = Some("medium".to_string());
        let envelope = translate(&b, "proj".to_string()).unwrap();
        let thinking = envelope.request.generation_config.unwrap().thinking_config.unwrap();
        assert_eq!(thinking["thinkingBudget"], -1);
    }

    #[test]
    fn explicit_thinking_suffix_overrides_reasoning_effort() {
        let mut b = body(json!([{"role": "user", "content": "hi"}]));
        b.model = "gemini-2.5-flash-nothinking".to_string();
        b.reasoning_effort = Some("high".to_string());
        let envelope = translate(&b, "proj".to_string()).unwrap();
        let thinking = envelope.request.generation_config.unwrap().thinking_config.unwrap();
        assert_eq!(thinking["thinkingBudget"], 0);
    }
}
