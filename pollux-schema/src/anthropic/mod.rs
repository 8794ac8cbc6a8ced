//! Anthropic Messages API schema.

mod error;
mod messages_request;
mod messages_response;

pub use error::{AnthropicErrorBody, AnthropicErrorObject};
pub use messages_request::{
    AnthropicContentBlock, AnthropicMessage, AnthropicMessageContent, AnthropicMessagesRequest,
    AnthropicSystem, AnthropicTool, AnthropicToolChoice,
};
pub use messages_response::{
    AnthropicMessagesResponse, AnthropicResponseBlock, AnthropicStreamEvent, AnthropicUsage,
};
