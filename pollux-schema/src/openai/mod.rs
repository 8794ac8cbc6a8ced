mod chat_request;
mod chat_response;
mod error;
mod model_list;
mod responses_error;
mod responses_request;

pub use chat_request::{
    ChatCompletionRequestBody, ChatMessage, ChatTool, ChatToolFunction, ContentPart, ImageUrl,
    MessageContent, ResponseFormat, StopSequences,
};
pub use chat_response::{
    ChatChoice, ChatChunkChoice, ChatCompletionChunk, ChatCompletionResponse, ChatDelta,
    ChatResponseMessage, ChatUsage,
};
pub use error::{OpenaiErrorBody, OpenaiErrorObject};
pub use model_list::{OpenaiModel, OpenaiModelList};
pub use responses_error::{OpenaiResponsesErrorBody, OpenaiResponsesErrorObject};
pub use responses_request::{
    OpenaiInput, OpenaiInputContent, OpenaiInputItem, OpenaiRequestBody, Reasoning,
};
