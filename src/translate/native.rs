//! Native Gemini passthrough (§4.7 final paragraph): the caller's request is
//! forwarded almost as-is, only gaining the permissive safety settings and,
//! unless the caller already set one, a thinking budget.

use pollux_schema::gemini::GeminiGenerateContentRequest;
use pollux_schema::geminicli::GeminiCliRequest;

use crate::error::TranslateError;

use super::envelope;

pub fn translate(
    mut body: GeminiGenerateContentRequest,
    model: &str,
    project: String,
) -> Result<GeminiCliRequest, TranslateError> {
    if body.contents.is_empty() {
        return Err(TranslateError::invalid("contents must not be empty"));
    }

    let caller_set_budget = body
        .generation_config
        .as_ref()
        .and_then(|config| config.thinking_config.as_ref())
        .is_some();

    let variant = envelope::resolve_variant(model);
    body.extra.remove("safetySettings");
    Ok(envelope::finalize(body, &variant, project, caller_set_budget))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> GeminiGenerateContentRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn passthrough_gains_safety_settings() {
        let b = body(json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]}));
        let envelope = translate(b, "gemini-2.5-pro", "proj".to_string()).unwrap();
        assert!(envelope.request.extra.contains_key("safetySettings"));
    }

    #[test]
    fn caller_thinking_config_is_preserved() {
        let b = body(json!({
            "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
            "generationConfig": {"thinkingConfig": {"thinkingBudget": 99}}
        }));
        let envelope = translate(b, "gemini-2.5-pro", "proj".to_string()).unwrap();
        let thinking = envelope.request.generation_config.unwrap().thinking_config.unwrap();
        assert_eq!(thinking["thinkingBudget"], 99);
    }

    #[test]
    fn empty_contents_rejected() {
        let b = body(json!({"contents": []}));
        assert!(translate(b, "gemini-2.5-pro", "proj".to_string()).is_err());
    }
}
