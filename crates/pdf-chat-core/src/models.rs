//! Core data models shared by the ingestion and conversation pipeline.

/// A chunk of the concatenated document text.
///
/// `chunk_index` is positional: it orders chunks for overlap reconstruction
/// but plays no part in retrieval ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub chunk_index: i64,
    pub text: String,
    /// SHA-256 of `text`, used as the index key.
    pub hash: String,
}

/// One exchange: the user's question and the model's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

impl Turn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A chunk returned from the index together with its similarity score.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk_index: i64,
    pub text: String,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub score: f32,
}
