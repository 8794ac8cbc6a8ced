//! Generic OpenAI-compatible error envelope, shared by Chat Completions,
//! Responses, and the native-Gemini-as-OpenAI-error surfaces.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ "error": { "message": "...", "type": "...", "code": "...", "param": ... } }`
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenaiErrorBody {
    #[serde(rename = "error")]
    pub inner: OpenaiErrorObject,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenaiErrorObject {
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<Value>,
}

impl OpenaiErrorBody {
    pub fn new(r#type: &str, message: impl Into<String>) -> Self {
        OpenaiErrorBody {
            inner: OpenaiErrorObject {
                message: message.into(),
                r#type: r#type.to_string(),
                code: None,
                param: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_error_envelope() {
        let body = OpenaiErrorBody::new("invalid_request_error", "bad request");
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["error"]["message"], "bad request");
        assert_eq!(value["error"]["type"], "invalid_request_error");
        assert!(value["error"].get("code").is_none());
    }
}
