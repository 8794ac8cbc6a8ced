//! OpenAI Responses → upstream translator (§4.7).

use serde_json::{Value, json};

use pollux_schema::gemini::{Content, GeminiGenerateContentRequest, GenerationConfig, Part};
use pollux_schema::geminicli::GeminiCliRequest;
use pollux_schema::openai::{OpenaiInput, OpenaiInputContent, OpenaiRequestBody};

use crate::error::TranslateError;

use super::envelope;
use super::markdown_images::split_markdown_images;

pub fn translate(
    body: &OpenaiRequestBody,
    project: String,
) -> Result<GeminiCliRequest, TranslateError> {
    let items = match &body.input {
        None | Some(OpenaiInput::Null(())) => Vec::new(),
        Some(OpenaiInput::Items(items)) => items.clone(),
    };
    if items.is_empty() {
        return Err(TranslateError::invalid("input must not be empty"));
    }

    let mut contents = Vec::new();
    for item in &items {
        let role = item.role.as_deref().unwrap_or("user");
        let parts = input_content_to_parts(&item.content)?;
        if parts.is_empty() {
            continue;
        }
        contents.push(Content {
            role: Some(if role == "assistant" { "model".to_string() } else { "user".to_string() }),
            parts,
            extra: Default::default(),
        });
    }
    if contents.is_empty() {
        return Err(TranslateError::invalid("input produced no content"));
    }

    let system_instruction = body.instructions.as_ref().map(|text| Content {
        role: None,
        parts: vec![Part {
            text: Some(text.clone()),
            ..Default::default()
        }],
        extra: Default::default(),
    });

    let mut generation_config = GenerationConfig::default();
    generation_config.temperature = body.temperature.map(f64::from);
    generation_config.top_p = body.top_p.map(f64::from);
    generation_config.max_output_tokens = body.max_output_tokens;

    let caller_set_budget = if let Some(reasoning) = &body.reasoning {
        if let Some(effort) = &reasoning.effort {
            let budget = reasoning_effort_to_budget(effort);
            *generation_config.thinking_config_mut() =
                Some(json!({"thinkingBudget": budget, "includeThoughts": true}));
            true
        } else {
            false
        }
    } else {
        false
    };

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
    Ok(envelope::finalize(request, &variant, project, caller_set_budget))
}

fn reasoning_effort_to_budget(effort: &str) -> i64 {
    match effort {
        "minimal" => 0,
        "low" => 1024,
        "medium" => 8192,
        "high" => 24576,
        _ => -1,
    }
}

fn input_content_to_parts(
    content: &Option<OpenaiInputContent>,
) -> Result<Vec<Part>, TranslateError> {
    match content {
        None | Some(OpenaiInputContent::Null(())) => Ok(Vec::new()),
        Some(OpenaiInputContent::Parts(parts)) => {
            let mut out = Vec::new();
            for part in parts {
                out.extend(value_part_to_parts(part)?);
            }
            Ok(out)
        }
    }
}

fn value_part_to_parts(part: &Value) -> Result<Vec<Part>, TranslateError> {
    let kind = part.get("type").and_then(Value::as_str).unwrap_or("");
    match kind {
        "input_text" | "output_text" | "text" => {
            let text = part.get("text").and_then(Value::as_str).unwrap_or_default();
            Ok(text_to_parts(text))
        }
        "input_image" => {
            let url = part
                .get("image_url")
                .and_then(Value::as_str)
                .ok_or_else(|| TranslateError::invalid("input_image missing image_url"))?;
            Ok(vec![image_url_to_part(url)])
        }
        other => Err(TranslateError::invalid(format!(
            "unsupported input item content type: {other}"
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
        Part {
            text: Some(url.to_string()),
            ..Default::default()
        }
    }
}

fn parse_data_uri(url: &str) -> Option<(String, String)> {
    let rest = url.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime.to_string(), data.to_string()))
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
            super::markdown_images::Segment::ImageUri(uri) => Some(image_url_to_part(&uri)),
        })
        .collect()
}

fn build_tools(
    body: &OpenaiRequestBody,
) -> Result<
    (
        Option<Vec<pollux_schema::gemini::Tool>>,
        Option<pollux_schema::gemini::ToolConfig>,
    ),
    TranslateError,
> {
    let Some(tools_value) = body.extra.get("tools") else {
        return Ok((None, None));
    };
    let Some(tools) = tools_value.as_array() else {
        return Ok((None, None));
    };
    if tools.is_empty() {
        return Ok((None, None));
    }

    let mut declarations = Vec::new();
    let mut wants_search = false;
    for tool in tools {
        match tool.get("type").and_then(Value::as_str) {
            Some("function") => declarations.push(json!({
                "name": tool.get("name").cloned().unwrap_or(Value::Null),
                "description": tool.get("description").cloned().unwrap_or(Value::String(String::new())),
                "parameters": tool.get("parameters").cloned().unwrap_or(Value::Null),
            })),
            Some("web_search") | Some("web_search_preview") => wants_search = true,
            _ => {}
        }
    }

    let mut gemini_tools = Vec::new();
    if !declarations.is_empty() {
        gemini_tools.push(
            serde_json::from_value(json!({"functionDeclarations": declarations}))
                .map_err(|e| TranslateError::invalid(e.to_string()))?,
        );
    }
    if wants_search {
        gemini_tools.push(
            serde_json::from_value(json!({"googleSearch": {}}))
                .expect("googleSearch tool literal parses"),
        );
    }
    if gemini_tools.is_empty() {
        return Ok((None, None));
    }

    Ok((Some(gemini_tools), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(value: Value) -> OpenaiRequestBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn string_input_becomes_user_turn() {
        let b = body(json!({"model": "gemini-2.5-pro", "input": "hello"}));
        let envelope = translate(&b, "proj".to_string()).unwrap();
        assert_eq!(envelope.request.contents[0].role.as_deref(), Some("user"));
        assert_eq!(envelope.request.contents[0].parts[0].text.as_deref(), Some("hello"));
    }

    #[test]
    fn instructions_become_system_instruction() {
        let b = body(json!({"model": "gemini-2.5-pro", "input": "hi", "instructions": "be brief"}));
        let envelope = translate(&b, "proj".to_string()).unwrap();
        assert_eq!(
            envelope.request.system_instruction.unwrap().parts[0].text.as_deref(),
            Some("be brief")
        );
    }

    #[test]
    fn function_tool_maps_to_declaration() {
        let b = body(json!({
            "model": "gemini-2.5-pro",
            "input": "hi",
            "tools": [{"type": "function", "name": "get_weather", "parameters": {"type": "object"}}],
        }));
        let envelope = translate(&b, "proj".to_string()).unwrap();
        assert_eq!(envelope.request.tools.unwrap().len(), 1);
    }

    #[test]
    fn empty_input_rejected() {
        let b = body(json!({"model": "gemini-2.5-pro"}));
        assert!(translate(&b, "proj".to_string()).is_err());
    }
}
