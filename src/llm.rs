//! OpenAI-compatible chat completions client.
//!
//! Implements [`ChatModel`] over `POST {base_url}/chat/completions`. Any
//! server speaking the same protocol works by changing `llm.base_url`.

use anyhow::Result;
use async_trait::async_trait;
use pdf_chat_core::chat::{ChatMessage, ChatModel, ChatRequest};
use pdf_chat_core::error::ProviderError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::LlmConfig;
use crate::http::{self, JsonEndpoint};

pub struct OpenAIChatModel {
    model: String,
    base_url: String,
    api_key_env: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIChatModel {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            api_key_env: config.api_key_env.clone(),
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let endpoint = JsonEndpoint {
            service: "OpenAI",
            url: format!("{}/chat/completions", self.base_url.trim_end_matches('/')),
            api_key: Some(http::api_key_from_env(&self.api_key_env)?),
            max_retries: self.max_retries,
        };
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            stream: false,
        };

        let output: ChatCompletionResponse =
            http::post_json(&self.client, &endpoint, &payload).await?;

        let content = output
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            warn!(model = %self.model, "empty completion content");
        }
        Ok(content)
    }
}
