use serde::{Deserialize, Serialize};

/// `{"type": "error", "error": {"type": "...", "message": "..."}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicErrorBody {
    pub r#type: String,
    pub error: AnthropicErrorObject,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicErrorObject {
    pub r#type: String,
    pub message: String,
}

impl AnthropicErrorBody {
    pub fn new(error_type: &str, message: impl Into<String>) -> Self {
        AnthropicErrorBody {
            r#type: "error".to_string(),
            error: AnthropicErrorObject {
                r#type: error_type.to_string(),
                message: message.into(),
            },
        }
    }
}
