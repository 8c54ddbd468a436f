//! Wire types for the OpenAI-compatible chat completions API
//!
//! LM Studio and OpenAI accept the same request shape; only the fields the
//! assistant uses are modelled.

use crate::types::ChatMessage;
use serde::{Deserialize, Serialize};

/// POST /chat/completions body
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

/// Response body (non-streaming)
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, trimmed
    pub fn first_content(&self) -> Option<String> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(|s| s.trim().to_string())
    }
}
