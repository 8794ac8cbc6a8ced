//! Anthropic Messages → upstream translator (§4.7).

use serde_json::{Value, json};

use pollux_schema::anthropic::{
    AnthropicContentBlock, AnthropicMessage, AnthropicMessageContent, AnthropicMessagesRequest,
};
use pollux_schema::gemini::{Content, GeminiGenerateContentRequest, GenerationConfig, Part};
use pollux_schema::geminicli::GeminiCliRequest;

use crate::error::TranslateError;

use super::envelope;
use super::markdown_images::split_markdown_images;

pub fn translate(
    body: &AnthropicMessagesRequest,
    project: String,
) -> Result<GeminiCliRequest, TranslateError> {
    if body.messages.is_empty() {
        return Err(TranslateError::invalid("messages must not be empty"));
    }

    let mut contents = Vec::new();
    for message in &body.messages {
        contents.push(Content {
            role: Some(map_role(&message.role)),
            parts: message_to_parts(message)?,
            extra: Default::default(),
        });
    }

    let system_instruction = body.system.as_ref().map(|s| Content {
        role: None,
        parts: vec![Part {
            text: Some(s.to_text()),
            ..Default::default()
        }],
        extra: Default::default(),
    });

    let mut generation_config = GenerationConfig::default();
    generation_config.temperature = body.temperature.map(f64::from);
    generation_config.top_p = body.top_p.map(f64::from);
    generation_config.top_k = body.top_k;
    generation_config.max_output_tokens = Some(body.max_tokens);
    if let Some(stops) = &body.stop_sequences {
        generation_config
            .extra
            .insert("stopSequences".to_string(), json!(stops));
    }

    let (tools, tool_config) = build_tools(body)?;

    let request = GeminiGenerateContentRequest {
        contents,
        system_instruction,
        generation_config: Some(generation_config),
        tools,
        tool_config,
        extra: Default::default(),
    };

    let variant = envelope::resolve_variant(&body.model);
    Ok(envelope::finalize(request, &variant, project, false))
}

fn map_role(role: &str) -> String {
    match role {
        "assistant" => "model".to_string(),
        _ => "user".to_string(),
    }
}

fn message_to_parts(message: &AnthropicMessage) -> Result<Vec<Part>, TranslateError> {
    match &message.content {
        AnthropicMessageContent::Text(text) => Ok(text_to_parts(text)),
        AnthropicMessageContent::Blocks(blocks) => {
            let mut parts = Vec::new();
            for block in blocks {
                parts.push(block_to_part(block)?);
            }
            Ok(parts)
        }
    }
}

fn block_to_part(block: &AnthropicContentBlock) -> Result<Part, TranslateError> {
    match block.r#type.as_str() {
        "text" => Ok(Part {
            text: Some(block.text.clone().unwrap_or_default()),
            ..Default::default()
        }),
        "image" => image_block_to_part(block),
        "tool_use" => Ok(Part {
            function_call: Some(json!({
                "name": block.name.clone().unwrap_or_default(),
                "args": block.input.clone().unwrap_or(Value::Null),
            })),
            ..Default::default()
        }),
        "tool_result" => {
            let response = block
                .content
                .clone()
                .unwrap_or_else(|| Value::String(String::new()));
            Ok(Part {
                function_response: Some(json!({
                    "name": block.tool_use_id.clone().unwrap_or_default(),
                    "response": {"result": response},
                })),
                ..Default::default()
            })
        }
        "thinking" | "redacted_thinking" => Ok(Part {
            thought: Some(true),
            text: Some(block.thinking.clone().unwrap_or_default()),
            ..Default::default()
        }),
        other => Err(TranslateError::invalid(format!(
            "unsupported content block type: {other}"
        ))),
    }
}

fn image_block_to_part(block: &AnthropicContentBlock) -> Result<Part, TranslateError> {
    let source = block
        .source
        .as_ref()
        .ok_or_else(|| TranslateError::invalid("image block missing source"))?;

    if source.get("type").and_then(Value::as_str) == Some("base64") {
        let mime = source
            .get("media_type")
            .and_then(Value::as_str)
            .unwrap_or("application/octet-stream");
        let data = source
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| TranslateError::invalid("base64 image source missing data"))?;
        Ok(Part {
            inline_data: Some(json!({"mimeType": mime, "data": data})),
            ..Default::default()
        })
    } else if let Some(url) = source.get("url").and_then(Value::as_str) {
        Ok(Part {
            text: Some(url.to_string()),
            ..Default::default()
        })
    } else {
        Err(TranslateError::invalid("unsupported image source"))
    }
}

fn text_to_parts(text: &str) -> Vec<Part> {
    split_markdown_images(text)
        .into_iter()
        .filter_map(|segment| match segment {
            super::markdown_images::Segment::Text(t) if !t.is_empty() => Some(Part {
                text: Some(t),
                ..Default::default()
            }),
            super::markdown_images::Segment::Text(_) => None,
            super::markdown_images::Segment::ImageUri(uri) => Some(Part {
                text: Some(uri),
                ..Default::default()
            }),
        })
        .collect()
}

fn build_tools(
    body: &AnthropicMessagesRequest,
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

    let declarations: Vec<Value> = tools
        .iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description.clone().unwrap_or_default(),
                "parameters": t.input_schema,
            })
        })
        .collect();

    let gemini_tools = vec![serde_json::from_value(json!({"functionDeclarations": declarations}))
        .map_err(|e| TranslateError::invalid(e.to_string()))?];

    let tool_config = body.tool_choice.as_ref().map(|choice| {
        let mode_value = match choice.r#type.as_str() {
            "any" => json!({"mode": "ANY"}),
            "tool" => json!({
                "mode": "ANY",
                "allowedFunctionNames": [choice.name.clone().unwrap_or_default()],
            }),
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

    fn body(messages: Value, system: Option<Value>) -> AnthropicMessagesRequest {
        let mut value = json!({
            "model": "gemini-2.5-pro",
            "max_tokens": 100,
            "messages": messages,
        });
        if let Some(system) = system {
            value["system"] = system;
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn system_string_becomes_system_instruction() {
        let b = body(json!([{"role": "user", "content": "hi"}]), Some(json!("be terse")));
        let envelope = translate(&b, "proj".to_string()).unwrap();
        assert_eq!(
            envelope.request.system_instruction.unwrap().parts[0].text.as_deref(),
            Some("be terse")
        );
    }

    #[test]
    fn tool_use_maps_to_function_call() {
        let b = body(
            json!([{"role": "assistant", "content": [{"type": "tool_use", "id": "t1", "name": "get_weather", "input": {"city": "London"}}]}]),
            None,
        );
        let envelope = translate(&b, "proj".to_string()).unwrap();
        assert!(envelope.request.contents[0].parts[0].function_call.is_some());
    }

    #[test]
    fn tool_result_maps_to_user_function_response() {
        let b = body(
            json!([{"role": "user", "content": [{"type": "tool_result", "tool_use_id": "t1", "content": "15C"}]}]),
            None,
        );
        let envelope = translate(&b, "proj".to_string()).unwrap();
        assert_eq!(envelope.request.contents[0].role.as_deref(), Some("user"));
        assert!(envelope.request.contents[0].parts[0].function_response.is_some());
    }

    #[test]
    fn base64_image_becomes_inline_data() {
        let b = body(
            json!([{"role": "user", "content": [{"type": "image", "source": {"type": "base64", "media_type": "image/png", "data": "abc"}}]}]),
            None,
        );
        let envelope = translate(&b, "proj".to_string()).unwrap();
        assert!(envelope.request.contents[0].parts[0].inline_data.is_some());
    }

    #[test]
    fn empty_messages_rejected() {
        let b = body(json!([]), None);
        assert!(translate(&b, "proj".to_string()).is_err());
    }
}
