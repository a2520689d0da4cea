//! Embedding provider implementations.
//!
//! Concrete backends for the [`EmbeddingProvider`] trait defined in
//! `pdf-chat-core`:
//! - **[`OpenAIProvider`]** — calls the OpenAI `/embeddings` endpoint.
//! - **[`OllamaProvider`]** — calls a local Ollama instance's `/api/embed`.
//!
//! Both go through the shared retry loop in [`crate::http`]. The OpenAI
//! API key is read from the environment on every call, so a missing key
//! only surfaces when the first embedding is requested.
//!
//! Use [`create_provider`] to pick a backend from the configuration.

use anyhow::{bail, Result};
use async_trait::async_trait;
use pdf_chat_core::embedding::EmbeddingProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::EmbeddingConfig;
use crate::http::{self, JsonEndpoint};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI API (or any compatible endpoint).
pub struct OpenAIProvider {
    model: String,
    base_url: String,
    api_key_env: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            model: config.model.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            api_key_env: config.api_key_env.clone(),
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbedding>,
}

#[derive(Deserialize)]
struct OpenAIEmbedding {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let endpoint = JsonEndpoint {
            service: "OpenAI",
            url: format!("{}/embeddings", self.base_url.trim_end_matches('/')),
            api_key: Some(http::api_key_from_env(&self.api_key_env)?),
            max_retries: self.max_retries,
        };
        let body = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let mut response: OpenAIEmbeddingResponse =
            http::post_json(&self.client, &endpoint, &body).await?;

        // Order by index so vectors line up with the input texts.
        response.data.sort_by_key(|item| item.index);
        Ok(response.data.into_iter().map(|item| item.embedding).collect())
    }
}

// ============ Ollama Provider ============

/// Embedding provider using a local Ollama instance.
///
/// Requires Ollama to be running with an embedding model pulled
/// (e.g. `ollama pull nomic-embed-text`).
pub struct OllamaProvider {
    model: String,
    base_url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            model: config.model.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| OLLAMA_BASE_URL.to_string()),
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let endpoint = JsonEndpoint {
            service: "Ollama",
            url: format!("{}/api/embed", self.base_url.trim_end_matches('/')),
            api_key: None,
            max_retries: self.max_retries,
        };
        let body = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response: OllamaEmbeddingResponse =
            http::post_json(&self.client, &endpoint, &body).await?;
        Ok(response.embeddings)
    }
}

/// Create the configured [`EmbeddingProvider`].
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"openai"` | [`OpenAIProvider`] |
/// | `"ollama"` | [`OllamaProvider`] |
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIProvider::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}
