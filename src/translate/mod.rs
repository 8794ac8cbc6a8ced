//! Request/response translation between the four public schemas and the
//! upstream Gemini Code Assist wire format (§4.7, §4.9).

mod anthropic;
mod envelope;
mod markdown_images;
mod native;
mod openai_chat;
mod openai_responses;
pub mod response;
pub mod sse;

pub use anthropic::translate as anthropic_to_upstream;
pub use native::translate as native_to_upstream;
pub use openai_chat::translate as openai_chat_to_upstream;
pub use openai_responses::translate as openai_responses_to_upstream;
