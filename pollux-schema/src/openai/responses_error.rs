//! OpenAI Responses API error schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OpenAI-compatible error response schema.
///
/// Standard envelope:
/// `{ "error": { "message": "...", "type": "...", "code": "...", "param": ... } }`
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenaiResponsesErrorBody {
    #[serde(rename = "error")]
    pub inner: OpenaiResponsesErrorObject,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenaiResponsesErrorObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_serializes_under_error_key() {
        let body = OpenaiResponsesErrorBody {
            inner: OpenaiResponsesErrorObject {
                code: Some("invalid_request".to_string()),
                message: "bad input".to_string(),
                r#type: "invalid_request_error".to_string(),
                param: None,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["error"]["message"], "bad input");
        assert_eq!(value["error"]["code"], "invalid_request");
    }
}
