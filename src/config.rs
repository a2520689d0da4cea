//! Configuration parsing and validation.
//!
//! PDF Chat is configured via a TOML file (default: `config/pdf-chat.toml`).
//! Every section and field has a default, and a missing file means "use the
//! defaults", so the binary runs with no configuration at all as long as an
//! API key is present in the environment.
//!
//! # Example Configuration
//!
//! ```toml
//! [chunking]
//! chunk_size = 1000
//! chunk_overlap = 200
//!
//! [retrieval]
//! top_k = 4
//! condense_question = true
//!
//! [history]
//! max_messages = 100
//!
//! [embedding]
//! provider = "openai"          # "openai" or "ollama"
//! model = "text-embedding-ada-002"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [llm]
//! model = "gpt-3.5-turbo"
//! temperature = 0.0
//!
//! [server]
//! bind = "127.0.0.1:8501"
//!
//! [test_data]
//! folder = "./test_data"
//! include_globs = ["*.pdf"]
//!
//! [comparison]
//! follow_up = false
//! ```

use anyhow::{bail, Context, Result};
use pdf_chat_core::chunk::{ChunkParams, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use pdf_chat_core::comparison::default_prompts;
use pdf_chat_core::history::DEFAULT_MAX_MESSAGES;
use pdf_chat_core::session::SessionSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Questions asked by the batch test mode.
pub const DEFAULT_TEST_QUESTIONS: [&str; 6] = [
    "Who is Andrii Mikita?",
    "Why should I hire Andrii Mikita?",
    "Where are the top startups located?",
    "What does Stripe company do?",
    "How can I resolve the issue of my coffee being trapped in the machine?",
    "What do the colors in the 'CONTAINER' panel mean?",
];

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub history: HistoryConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub test_data: TestDataConfig,
    pub comparison: ComparisonConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Rewrite follow-up questions into standalone ones before retrieval.
    pub condense_question: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            condense_question: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    /// Flattened message count (two per turn) above which history resets.
    pub max_messages: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    /// Overrides the provider's default endpoint.
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub batch_size: usize,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-ada-002".to_string(),
            base_url: None,
            api_key_env: default_api_key_env(),
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    /// OpenAI-compatible API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub api_key_env: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: default_api_key_env(),
            max_retries: 3,
            timeout_secs: 60,
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Largest accepted upload request body.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TestDataConfig {
    pub folder: PathBuf,
    /// Matched against file names at the top level of `folder`.
    pub include_globs: Vec<String>,
    pub questions: Vec<String>,
}

impl Default for TestDataConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("./test_data"),
            include_globs: vec!["*.pdf".to_string()],
            questions: DEFAULT_TEST_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ComparisonConfig {
    pub prompts: Vec<String>,
    /// Index the CV and job description afterwards so the chat can continue
    /// with follow-up questions.
    pub follow_up: bool,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            prompts: default_prompts(),
            follow_up: false,
        }
    }
}

impl Config {
    /// Settings handed to the conversation session.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            chunking: ChunkParams {
                chunk_size: self.chunking.chunk_size,
                chunk_overlap: self.chunking.chunk_overlap,
            },
            top_k: self.retrieval.top_k,
            condense_question: self.retrieval.condense_question,
            max_messages: self.history.max_messages,
            embed_batch_size: self.embedding.batch_size,
            temperature: self.llm.temperature,
            comparison_prompts: self.comparison.prompts.clone(),
            comparison_follow_up: self.comparison.follow_up,
        }
    }

    /// Check field ranges and provider names.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            bail!("chunking.chunk_size must be > 0");
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            bail!("chunking.chunk_overlap must be smaller than chunking.chunk_size");
        }

        if self.retrieval.top_k < 1 {
            bail!("retrieval.top_k must be >= 1");
        }

        if self.history.max_messages < 2 {
            bail!("history.max_messages must be >= 2");
        }

        if self.embedding.batch_size < 1 {
            bail!("embedding.batch_size must be >= 1");
        }
        if self.embedding.model.trim().is_empty() {
            bail!("embedding.model must not be empty");
        }
        match self.embedding.provider.as_str() {
            "openai" | "ollama" => {}
            other => bail!(
                "Unknown embedding provider: '{}'. Must be openai or ollama.",
                other
            ),
        }

        if self.llm.model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!("llm.temperature must be in [0.0, 2.0]");
        }

        if self.test_data.include_globs.is_empty() {
            bail!("test_data.include_globs must not be empty");
        }
        if self.test_data.questions.is_empty() {
            bail!("test_data.questions must not be empty");
        }
        if self.comparison.prompts.is_empty() {
            bail!("comparison.prompts must not be empty");
        }

        Ok(())
    }
}

/// Load and validate the configuration at `path`.
///
/// A missing file yields the built-in defaults; an unreadable or malformed
/// file is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str::<Config>(&content).with_context(|| "Failed to parse config file")?
    } else {
        debug!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pdf-chat.toml");
        fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.history.max_messages, 100);
        assert_eq!(config.server.bind, "127.0.0.1:8501");
        assert_eq!(config.test_data.questions.len(), 6);
        assert_eq!(config.llm.temperature, 0.0);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let (_tmp, path) = write_config(
            r#"
[retrieval]
top_k = 2

[embedding]
provider = "ollama"
model = "nomic-embed-text"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.retrieval.top_k, 2);
        assert!(config.retrieval.condense_question);
        assert_eq!(config.embedding.provider, "ollama");
        assert_eq!(config.embedding.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.chunking.chunk_size, 1000);
    }

    #[test]
    fn test_session_settings_mapping() {
        let (_tmp, path) = write_config(
            r#"
[chunking]
chunk_size = 500
chunk_overlap = 50

[history]
max_messages = 10

[comparison]
prompts = ["Is this a fit?"]
follow_up = true
"#,
        );
        let settings = load_config(&path).unwrap().session_settings();
        assert_eq!(settings.chunking.chunk_size, 500);
        assert_eq!(settings.chunking.chunk_overlap, 50);
        assert_eq!(settings.max_messages, 10);
        assert_eq!(settings.comparison_prompts, vec!["Is this a fit?"]);
        assert!(settings.comparison_follow_up);
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        let (_tmp, path) = write_config("[chunking]\nchunk_size = 100\nchunk_overlap = 100\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let (_tmp, path) = write_config("[embedding]\nprovider = \"local\"\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_rejects_bad_ranges() {
        for content in [
            "[retrieval]\ntop_k = 0\n",
            "[history]\nmax_messages = 1\n",
            "[llm]\ntemperature = 3.5\n",
            "[embedding]\nbatch_size = 0\n",
            "[comparison]\nprompts = []\n",
            "[test_data]\nquestions = []\n",
        ] {
            let (_tmp, path) = write_config(content);
            assert!(load_config(&path).is_err(), "accepted: {}", content);
        }
    }

    #[test]
    fn test_malformed_file_is_error() {
        let (_tmp, path) = write_config("[chunking\nchunk_size = ");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }
}
