//! Shared fixtures: minimal PDFs and deterministic in-process providers.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use pdf_chat::config::Config;
use pdf_chat_core::chat::{ChatModel, ChatRequest};
use pdf_chat_core::embedding::EmbeddingProvider;
use pdf_chat_core::error::ProviderError;
use pdf_chat_core::session::Assistant;

/// Minimal single-page PDF whose content stream draws `phrase`.
/// Builds the body then the xref with correct byte offsets so pdf-extract
/// can parse it. `phrase` must not contain parentheses or backslashes.
pub fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase);

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            stream.len(),
            stream
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

const DIMS: usize = 32;

/// Hashes words into a small bag-of-words vector.
#[derive(Default)]
pub struct BagOfWords {
    pub calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for BagOfWords {
    fn model_name(&self) -> &str {
        "bag-of-words"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; DIMS];
                for word in text.split(|c: char| !c.is_alphanumeric()) {
                    if word.len() >= 3 {
                        let bucket = word
                            .to_lowercase()
                            .bytes()
                            .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
                        v[bucket % DIMS] += 1.0;
                    }
                }
                v
            })
            .collect())
    }
}

/// Answers "answer to: <last message>"; can be switched to throttle or fail.
#[derive(Default)]
pub struct EchoModel {
    pub calls: AtomicUsize,
    pub throttled: AtomicBool,
    pub broken: AtomicBool,
}

#[async_trait]
impl ChatModel for EchoModel {
    fn model_name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.throttled.load(Ordering::SeqCst) {
            return Err(ProviderError::RateLimited("429 Too Many Requests".into()));
        }
        if self.broken.load(Ordering::SeqCst) {
            return Err(ProviderError::Failed(anyhow::anyhow!("model backend unavailable")));
        }
        let last = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(format!("answer to: {}", last))
    }
}

pub struct Fakes {
    pub embedder: Arc<BagOfWords>,
    pub model: Arc<EchoModel>,
    pub assistant: Assistant,
}

/// An assistant over fake providers, configured from `config`.
pub fn fake_assistant(config: &Config) -> Fakes {
    let embedder = Arc::new(BagOfWords::default());
    let model = Arc::new(EchoModel::default());
    let assistant = Assistant::new(embedder.clone(), model.clone(), config.session_settings());
    Fakes {
        embedder,
        model,
        assistant,
    }
}
