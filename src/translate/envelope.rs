//! Shared envelope assembly (§4.7 "final envelope", §4.6 variant injection).
//! Every per-schema translator builds a [`pollux_schema::gemini::GeminiGenerateContentRequest`]
//! and hands it here to get safety settings, thinking config, and the
//! `{model, project, request}` wrapper applied uniformly.

use serde_json::{Value, json};

use pollux_schema::geminicli::{GeminiCliRequest, GeminiCliRequestMeta};
use pollux_schema::gemini::GeminiGenerateContentRequest;

use crate::catalog::{self, VariantConfig};

/// Permissive safety settings applied to every upstream call (§4.6).
pub fn default_safety_settings() -> Value {
    json!([
        {"category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_NONE"},
        {"category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_NONE"},
        {"category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_NONE"},
        {"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_NONE"},
        {"category": "HARM_CATEGORY_CIVIC_INTEGRITY", "threshold": "BLOCK_NONE"},
        {"category": "HARM_CATEGORY_IMAGE_DANGEROUS_CONTENT", "threshold": "BLOCK_NONE"},
        {"category": "HARM_CATEGORY_IMAGE_HARASSMENT", "threshold": "BLOCK_NONE"},
        {"category": "HARM_CATEGORY_IMAGE_HATE", "threshold": "BLOCK_NONE"},
        {"category": "HARM_CATEGORY_IMAGE_SEXUALLY_EXPLICIT", "threshold": "BLOCK_NONE"},
        {"category": "HARM_CATEGORY_UNSPECIFIED", "threshold": "BLOCK_NONE"},
        {"category": "HARM_CATEGORY_JAILBREAK", "threshold": "BLOCK_NONE"},
    ])
}

/// Applies the resolved model variant (search injection, thinking budget)
/// and the permissive safety defaults to a translated request, then wraps it
/// in the upstream envelope.
pub fn finalize(
    mut request: GeminiGenerateContentRequest,
    variant: &VariantConfig,
    project: String,
    caller_set_thinking_budget: bool,
) -> GeminiCliRequest {
    request.extra.insert("safetySettings".to_string(), default_safety_settings());

    if variant.inject_search {
        let mut tools = request.tools.take().unwrap_or_default();
        tools.push(
            serde_json::from_value(json!({"googleSearch": {}}))
                .expect("googleSearch tool literal parses"),
        );
        request.tools = Some(tools);
    }

    if !caller_set_thinking_budget {
        let generation_config = request.generation_config.get_or_insert_with(Default::default);
        *generation_config.thinking_config_mut() = Some(json!({
            "thinkingBudget": variant.thinking_budget,
            "includeThoughts": variant.include_thoughts,
        }));
    }

    GeminiCliRequestMeta {
        model: variant.base_name.clone(),
        project,
    }
    .into_request(request)
}

pub fn resolve_variant(model: &str) -> VariantConfig {
    catalog::resolve_variant(model)
}

pub fn has_thinking_variant_suffix(model: &str) -> bool {
    catalog::has_thinking_variant_suffix(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_request() -> GeminiGenerateContentRequest {
        serde_json::from_value(serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": "hi"}]}]
        }))
        .unwrap()
    }

    #[test]
    fn finalize_injects_safety_settings_and_thinking_budget() {
        let variant = resolve_variant("gemini-2.5-flash-nothinking");
        let envelope = finalize(minimal_request(), &variant, "proj".to_string(), false);
        assert_eq!(envelope.model, "gemini-2.5-flash");
        assert_eq!(envelope.project, "proj");
        assert!(envelope.request.extra.contains_key("safetySettings"));
        let thinking = envelope
            .request
            .generation_config
            .unwrap()
            .thinking_config
            .unwrap();
        assert_eq!(thinking["thinkingBudget"], 0);
    }

    #[test]
    fn finalize_injects_search_tool_for_search_variant() {
        let variant = resolve_variant("gemini-2.5-pro-search");
        let envelope = finalize(minimal_request(), &variant, "proj".to_string(), false);
        let tools = envelope.request.tools.unwrap();
        assert_eq!(tools.len(), 1);
    }

    #[test]
    fn finalize_respects_caller_supplied_thinking_budget() {
        let variant = resolve_variant("gemini-2.5-pro");
        let mut request = minimal_request();
        request.generation_config = Some(serde_json::from_value(serde_json::json!({
            "thinkingConfig": {"thinkingBudget": 42}
        })).unwrap());
        let envelope = finalize(request, &variant, "proj".to_string(), true);
        let thinking = envelope.request.generation_config.unwrap().thinking_config.unwrap();
        assert_eq!(thinking["thinkingBudget"], 42);
    }
}
