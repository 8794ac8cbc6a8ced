//! Typed Gemini v1beta request schema for Gemini generate-content endpoints.
//!
//! Instead of passing through raw `serde_json::Value`, we parse the incoming
//! Gemini native request into properly typed structs. This gives us:
//! - Compile-time access to known fields (e.g. `systemInstruction` for Claude
//!   preamble injection).
//! - Forward compatibility via `extra` catch-all maps at every level.
//! - Validation-friendly request shape (e.g. required `contents`).

mod content;
mod generation;
mod system_instruction;
mod tool;
mod tool_config;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub use content::{Content, Part};
pub use generation::GenerationConfig;
use system_instruction::deserialize_system_instruction;
pub use tool::{FunctionDeclaration, Tool};
pub use tool_config::ToolConfig;

/// Gemini `generateContent` / `streamGenerateContent` request body.
///
/// Reference: <https://ai.google.dev/gemini-api/docs/text-generation>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerateContentRequest {
    /// Required conversation turns.
    pub contents: Vec<Content>,

    /// System-level instruction. Structured identically to a `Content` but
    /// typically contains only a single text part with no `role`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_system_instruction"
    )]
    pub system_instruction: Option<Content>,

    /// Generation parameters (temperature, topP, maxOutputTokens, …).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,

    /// Tool declarations (function calling, code execution, …).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,

    /// Tool-calling configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,

    /// Catch-all for future/optional unknown fields, including
    /// `safetySettings` and `cachedContent`.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl GeminiGenerateContentRequest {
    /// Mutable access to normalized `systemInstruction` content.
    ///
    /// Normalization is handled during deserialization: role is dropped,
    /// text parts are merged, and empty/non-text instructions become `None`.
    pub fn system_instruction_mut(&mut self) -> &mut Option<Content> {
        &mut self.system_instruction
    }
}
