pub mod anthropic;
pub mod gemini;
pub mod geminicli;
pub mod openai;

pub use anthropic::{AnthropicMessagesRequest, AnthropicMessagesResponse};
pub use geminicli::{GeminiCliRequest, GeminiCliRequestMeta, GeminiCliResponseBody};
pub use openai::{
    ChatCompletionRequestBody, ChatCompletionResponse, OpenaiRequestBody, OpenaiResponsesErrorBody,
    OpenaiResponsesErrorObject,
};
