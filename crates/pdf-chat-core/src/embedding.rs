//! Embedding provider trait and vector utilities.
//!
//! Defines the [`EmbeddingProvider`] trait that all embedding backends
//! implement, a batching helper, and cosine similarity.
//!
//! Concrete provider implementations (OpenAI, Ollama) live in the
//! `pdf-chat` app crate.

use anyhow::{bail, Result};
use async_trait::async_trait;

/// Trait for embedding providers.
///
/// Implementations are created by the application and shared by the
/// ingestion pipeline (chunk embedding) and the session (query embedding).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Embed a batch of texts, returning one vector per input in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed `texts` in batches of at most `batch_size`.
///
/// Fails if the provider returns a different number of vectors than it was
/// given texts for any batch.
pub async fn embed_in_batches(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let embedded = provider.embed(batch).await?;
        if embedded.len() != batch.len() {
            bail!(
                "embedding provider '{}' returned {} vectors for {} texts",
                provider.model_name(),
                embedded.len(),
                batch.len()
            );
        }
        vectors.extend(embedded);
    }
    Ok(vectors)
}

/// Embed a single query text.
pub async fn embed_query(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    let results = provider.embed(&[text.to_string()]).await?;
    results
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
}

/// Cosine of the angle between `a` and `b`, in `[-1.0, 1.0]`.
///
/// Mismatched lengths, empty vectors and zero vectors score `0.0`, so they
/// rank below any real match in the index.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, sq_a, sq_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, sq_a, sq_b), (x, y)| {
            (dot + x * y, sq_a + x * x, sq_b + y * y)
        });

    let magnitude = (sq_a * sq_b).sqrt();
    if magnitude < f32::EPSILON {
        0.0
    } else {
        dot / magnitude
    }
}
