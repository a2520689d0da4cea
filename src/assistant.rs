//! Wiring of the configured providers into an [`Assistant`].

use std::sync::Arc;

use anyhow::Result;
use pdf_chat_core::session::Assistant;
use tracing::debug;

use crate::config::Config;
use crate::embedding::create_provider;
use crate::llm::OpenAIChatModel;

/// Build the assistant from configuration. No network calls are made and
/// the API key is not read until the first request.
pub fn build_assistant(config: &Config) -> Result<Assistant> {
    let embedder = create_provider(&config.embedding)?;
    let model = Arc::new(OpenAIChatModel::new(&config.llm)?);
    debug!(
        embedding = %config.embedding.provider,
        embedding_model = %config.embedding.model,
        llm_model = %config.llm.model,
        "assistant configured"
    );
    Ok(Assistant::new(embedder, model, config.session_settings()))
}
