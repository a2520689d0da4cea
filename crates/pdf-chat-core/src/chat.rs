//! Chat model abstraction.
//!
//! The session and the comparison battery talk to the language model only
//! through [`ChatModel`]. The OpenAI-compatible client lives in the app crate.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ProviderError;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A single completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

/// A language model that answers a list of messages with one reply.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// Complete the conversation, returning the assistant's reply text.
    ///
    /// Implementations must report throttling as
    /// [`ProviderError::RateLimited`] so callers can recover from it.
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError>;
}
