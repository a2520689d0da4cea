//! Conversation session: ingestion into an index, retrieval-augmented
//! answers with bounded history, and the comparison battery.
//!
//! A [`Session`] is either [`Session::Uninitialized`] (nothing ingested yet)
//! or [`Session::Ready`] with a [`Conversation`] binding one
//! [`VectorIndex`] to one [`History`]. The session is a plain value owned by
//! the caller (the HTTP state or a CLI command) and passed by `&mut` into
//! [`Assistant::ingest`] and [`Assistant::answer`].
//!
//! # Answer flow
//!
//! 1. `Uninitialized` → [`AnswerOutcome::NeedsDocuments`]; nothing is called.
//! 2. With history present and condensing enabled, rewrite the query into a
//!    standalone question with one model call.
//! 3. Embed the (standalone) query and take the top-`k` chunks.
//! 4. Ask the model with context + full history + query.
//! 5. Append the turn, snapshot the transcript, then apply the history cap.
//!
//! A rate-limit failure at any step yields [`AnswerOutcome::RateLimited`]
//! and leaves the history untouched.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::{ChatModel, ChatRequest};
use crate::chunk::{chunk_text, ChunkParams};
use crate::comparison::{default_prompts, run_comparison, ComparisonPair};
use crate::embedding::{embed_in_batches, embed_query, EmbeddingProvider};
use crate::error::{is_rate_limited, IngestError};
use crate::history::{History, DEFAULT_MAX_MESSAGES};
use crate::index::VectorIndex;
use crate::models::{RetrievedChunk, Turn};
use crate::prompt::{answer_messages, condense_messages};

/// Returned for any query before documents have been ingested.
pub const NO_SESSION_MESSAGE: &str = "Please upload the files so I can answer your questions.";

/// Returned when the model provider throttles a request.
pub const RATE_LIMIT_MESSAGE: &str =
    "Sorry, you've reached the limit for requests. Please try again later.";

/// Tuning for ingestion, retrieval, history and comparison.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub chunking: ChunkParams,
    /// Number of chunks retrieved per query.
    pub top_k: usize,
    /// Rewrite follow-up questions into standalone ones before retrieval.
    pub condense_question: bool,
    /// Flattened message count above which the history is reset.
    pub max_messages: usize,
    pub embed_batch_size: usize,
    pub temperature: f32,
    pub comparison_prompts: Vec<String>,
    /// After a comparison, index the CV and job description as the new
    /// session so follow-up questions can be asked.
    pub comparison_follow_up: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            chunking: ChunkParams::default(),
            top_k: 4,
            condense_question: true,
            max_messages: DEFAULT_MAX_MESSAGES,
            embed_batch_size: 64,
            temperature: 0.0,
            comparison_prompts: default_prompts(),
            comparison_follow_up: false,
        }
    }
}

/// One index plus the history of questions asked against it.
pub struct Conversation {
    id: String,
    index: VectorIndex,
    history: History,
}

impl Conversation {
    pub fn new(index: VectorIndex, max_messages: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            index,
            history: History::new(max_messages),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}

/// The live session state.
#[derive(Default)]
pub enum Session {
    #[default]
    Uninitialized,
    Ready(Conversation),
}

impl Session {
    pub fn is_ready(&self) -> bool {
        matches!(self, Session::Ready(_))
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        match self {
            Session::Uninitialized => None,
            Session::Ready(c) => Some(c),
        }
    }

    /// Current turns, empty before ingestion.
    pub fn turns(&self) -> &[Turn] {
        self.conversation()
            .map(|c| c.history.turns())
            .unwrap_or(&[])
    }

    /// Replace whatever was there; the old index and history go together.
    pub fn replace(&mut self, conversation: Conversation) {
        *self = Session::Ready(conversation);
    }
}

/// Counts reported after a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub conversation_id: String,
    pub documents: usize,
    pub characters: usize,
    pub chunks: usize,
    pub indexed: usize,
}

/// A successful answer and what is needed to display it.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// The rewritten question used for retrieval, when condensing ran.
    pub standalone_question: Option<String>,
    pub sources: Vec<RetrievedChunk>,
    /// Every turn including the new one, taken before the history cap ran.
    pub transcript: Vec<Turn>,
    /// The history was cleared after this answer.
    pub history_reset: bool,
}

#[derive(Debug, Clone)]
pub enum AnswerOutcome {
    NeedsDocuments,
    RateLimited,
    Answered(Answer),
}

impl AnswerOutcome {
    /// The text to show the user: the answer or a sentinel.
    pub fn message(&self) -> &str {
        match self {
            AnswerOutcome::NeedsDocuments => NO_SESSION_MESSAGE,
            AnswerOutcome::RateLimited => RATE_LIMIT_MESSAGE,
            AnswerOutcome::Answered(answer) => &answer.text,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, AnswerOutcome::Answered(_))
    }
}

/// What happened to the session after a comparison battery.
#[derive(Debug, Clone)]
pub enum FollowUp {
    /// Follow-up is disabled; the session was not touched.
    Skipped,
    /// The inputs were indexed as the new session.
    Indexed(IngestSummary),
    /// Indexing failed; the previous session is kept. Carries the text to
    /// show the user.
    Failed(String),
}

/// Result of a comparison run.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    /// One pair per prompt, in prompt order.
    pub pairs: Vec<ComparisonPair>,
    pub follow_up: FollowUp,
}

/// Binds the embedding provider and chat model to the session operations.
#[derive(Clone)]
pub struct Assistant {
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn ChatModel>,
    settings: SessionSettings,
}

impl Assistant {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn ChatModel>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            embedder,
            model,
            settings,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Concatenate `texts`, chunk, embed and index them, then replace the
    /// session. On any failure the previous session is left as it was.
    pub async fn ingest(&self, session: &mut Session, texts: &[String]) -> Result<IngestSummary> {
        if texts.is_empty() {
            return Err(IngestError::NoDocuments.into());
        }
        let text: String = texts.concat();
        let (conversation, mut summary) = self.build_conversation(&text).await?;
        summary.documents = texts.len();
        session.replace(conversation);
        Ok(summary)
    }

    async fn build_conversation(&self, text: &str) -> Result<(Conversation, IngestSummary)> {
        let document_id = Uuid::new_v4().to_string();
        let chunks = chunk_text(&document_id, text, &self.settings.chunking);
        if chunks.is_empty() {
            return Err(IngestError::NoText.into());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_in_batches(
            self.embedder.as_ref(),
            &texts,
            self.settings.embed_batch_size,
        )
        .await
        .context("embedding document chunks")?;

        let chunk_count = chunks.len();
        let index = VectorIndex::build(chunks, vectors)?;
        let conversation = Conversation::new(index, self.settings.max_messages);

        let summary = IngestSummary {
            conversation_id: conversation.id().to_string(),
            documents: 1,
            characters: text.chars().count(),
            chunks: chunk_count,
            indexed: conversation.index().len(),
        };
        info!(
            conversation = %summary.conversation_id,
            characters = summary.characters,
            chunks = summary.chunks,
            indexed = summary.indexed,
            model = self.embedder.model_name(),
            "built conversation index"
        );
        Ok((conversation, summary))
    }

    /// Answer `query` against the current session.
    pub async fn answer(&self, session: &mut Session, query: &str) -> Result<AnswerOutcome> {
        let conversation = match session {
            Session::Uninitialized => {
                debug!("query before ingestion");
                return Ok(AnswerOutcome::NeedsDocuments);
            }
            Session::Ready(conversation) => conversation,
        };

        let (text, standalone_question, sources) = match self.respond(conversation, query).await {
            Ok(reply) => reply,
            Err(e) if is_rate_limited(&e) => {
                warn!(error = %e, "model provider rate limited the request");
                return Ok(AnswerOutcome::RateLimited);
            }
            Err(e) => return Err(e),
        };

        conversation.history.push(Turn::new(query, text.clone()));
        let transcript = conversation.history.turns().to_vec();
        let history_reset = conversation.history.enforce_cap();
        if history_reset {
            info!(
                conversation = %conversation.id,
                max_messages = conversation.history.max_messages(),
                "history exceeded cap, reset"
            );
        }

        Ok(AnswerOutcome::Answered(Answer {
            text,
            standalone_question,
            sources,
            transcript,
            history_reset,
        }))
    }

    /// Model calls for one answer. Reads the conversation, never mutates it.
    async fn respond(
        &self,
        conversation: &Conversation,
        query: &str,
    ) -> Result<(String, Option<String>, Vec<RetrievedChunk>)> {
        let history = conversation.history.turns();

        let standalone_question = if self.settings.condense_question && !history.is_empty() {
            let request = ChatRequest {
                messages: condense_messages(history, query),
                temperature: self.settings.temperature,
            };
            let rewritten = self.model.complete(&request).await?;
            Some(rewritten.trim().to_string()).filter(|q| !q.is_empty())
        } else {
            None
        };

        let retrieval_query = standalone_question.as_deref().unwrap_or(query);
        let sources = if retrieval_query.trim().is_empty() {
            Vec::new()
        } else {
            let query_vec = embed_query(self.embedder.as_ref(), retrieval_query)
                .await
                .context("embedding query")?;
            conversation.index.search(&query_vec, self.settings.top_k)
        };
        debug!(hits = sources.len(), "retrieved context");

        let request = ChatRequest {
            messages: answer_messages(&sources, history, query),
            temperature: self.settings.temperature,
        };
        let text = self.model.complete(&request).await?;

        Ok((text.trim().to_string(), standalone_question, sources))
    }

    /// Run the comparison battery over a CV and a job description.
    ///
    /// With `comparison_follow_up` enabled the inputs then become the new
    /// session; otherwise the session is not touched. A failed follow-up
    /// index is reported in [`ComparisonReport::follow_up`] and never
    /// discards the pairs.
    pub async fn compare(
        &self,
        session: &mut Session,
        cv_text: &str,
        job_description: &str,
    ) -> Result<ComparisonReport> {
        let pairs = run_comparison(
            self.model.as_ref(),
            cv_text,
            job_description,
            &self.settings.comparison_prompts,
            self.settings.temperature,
        )
        .await?;

        if !self.settings.comparison_follow_up {
            return Ok(ComparisonReport {
                pairs,
                follow_up: FollowUp::Skipped,
            });
        }

        // The battery answers are kept whatever happens to the follow-up index.
        let combined = format!("{}\n{}", cv_text, job_description);
        let follow_up = match self.ingest(session, &[combined]).await {
            Ok(summary) => FollowUp::Indexed(summary),
            Err(e) if is_rate_limited(&e) => {
                warn!(error = %e, "rate limited while indexing comparison inputs");
                FollowUp::Failed(RATE_LIMIT_MESSAGE.to_string())
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "indexing comparison inputs failed");
                FollowUp::Failed(format!("Follow-up questions are unavailable: {:#}", e))
            }
        };

        Ok(ComparisonReport { pairs, follow_up })
    }
}
