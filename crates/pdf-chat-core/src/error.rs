//! Typed errors at the boundaries the session recovers from or validates.

use thiserror::Error;

/// Failure reported by an external model provider (chat or embeddings).
///
/// Only [`ProviderError::RateLimited`] is recovered from: the session turns
/// it into a sentinel answer. Everything else propagates.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider throttled the request (HTTP 429 / quota exhausted)
    /// and the client's own retries did not get through.
    #[error("rate limited by provider: {0}")]
    RateLimited(String),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl ProviderError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }
}

/// Returns `true` if an `anyhow` error chain carries a rate-limit failure.
pub fn is_rate_limited(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<ProviderError>()
            .is_some_and(ProviderError::is_rate_limited)
    })
}

/// Preconditions checked before the ingestion pipeline runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("No documents found. Upload at least one PDF.")]
    NoDocuments,
    #[error("No text could be extracted from the uploaded documents.")]
    NoText,
}

/// Missing input for comparison mode, checked before any model call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComparisonError {
    #[error("Please upload a CV.")]
    MissingCv,
    /// A CV was uploaded but yielded no text (e.g. a scanned image).
    #[error("No text could be extracted from the CV.")]
    UnreadableCv,
    #[error("Please enter a job description.")]
    MissingJobDescription,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_rate_limit_detected_through_context() {
        let err: anyhow::Result<()> = Err(ProviderError::RateLimited("429".into()).into());
        let err = err.context("embedding query").unwrap_err();
        assert!(is_rate_limited(&err));
    }

    #[test]
    fn test_other_failures_not_rate_limited() {
        let err = anyhow::Error::from(ProviderError::Failed(anyhow::anyhow!("boom")));
        assert!(!is_rate_limited(&err));
        assert!(!is_rate_limited(&anyhow::anyhow!("plain")));
    }
}
