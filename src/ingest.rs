//! Ingestion pipeline orchestration and the batch test mode.
//!
//! Uploaded documents flow: extraction → concatenation → chunking →
//! embedding → index, after which the session is replaced. The batch test
//! mode reads PDFs from the configured test folder, ingests them the same
//! way, and asks the configured questions in order. A missing or empty
//! folder yields a notice, and the questions still go to the live session.

use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use pdf_chat_core::error::IngestError;
use pdf_chat_core::session::{AnswerOutcome, Assistant, IngestSummary, Session};
use tracing::info;
use walkdir::WalkDir;

use crate::config::TestDataConfig;
use crate::extract::{extract_all, UploadedDocument};

pub const MISSING_FOLDER_NOTICE: &str = "The 'test_data' folder does not exist.";
pub const EMPTY_FOLDER_NOTICE: &str = "No PDF files found in the 'test_data' folder.";

/// Extract, index and install `docs` as the new session.
///
/// Nothing changes on failure: the previous session (if any) stays live.
pub async fn ingest_uploads(
    assistant: &Assistant,
    session: &mut Session,
    docs: &[UploadedDocument],
) -> Result<IngestSummary> {
    if docs.is_empty() {
        return Err(IngestError::NoDocuments.into());
    }

    let texts = extract_all(docs)?;
    info!(
        documents = docs.len(),
        bytes = docs.iter().map(|d| d.bytes.len()).sum::<usize>(),
        "extracted uploaded documents"
    );

    assistant.ingest(session, &texts).await
}

/// What the test folder holds.
#[derive(Debug, PartialEq, Eq)]
pub enum TestFolder {
    Missing,
    Empty,
    Found(Vec<PathBuf>),
}

impl TestFolder {
    /// User-facing notice for a folder that cannot be used.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            TestFolder::Missing => Some(MISSING_FOLDER_NOTICE),
            TestFolder::Empty => Some(EMPTY_FOLDER_NOTICE),
            TestFolder::Found(_) => None,
        }
    }
}

/// List matching files at the top level of the test folder, sorted by name.
pub fn scan_test_folder(config: &TestDataConfig) -> Result<TestFolder> {
    let root = &config.folder;
    if !root.is_dir() {
        return Ok(TestFolder::Missing);
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if include_set.is_match(name.as_ref()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    if paths.is_empty() {
        Ok(TestFolder::Empty)
    } else {
        Ok(TestFolder::Found(paths))
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// One question of the batch and the text shown for it.
#[derive(Debug, Clone)]
pub struct TestExchange {
    pub question: String,
    pub answer: String,
    pub sentinel: bool,
}

/// Outcome of the batch test mode.
#[derive(Debug, Clone)]
pub struct TestReport {
    /// Set when the folder was missing or empty; nothing was ingested and
    /// the questions went to whatever session was already live.
    pub notice: Option<&'static str>,
    pub files: Vec<String>,
    pub ingest: Option<IngestSummary>,
    pub exchanges: Vec<TestExchange>,
    /// Flattened history size after the last question.
    pub history_messages: usize,
}

/// Ingest the test folder and ask every configured question in order.
///
/// An unusable folder is reported through [`TestReport::notice`] and the
/// questions are still asked against the current session, so with nothing
/// ingested each answer is the upload sentinel.
pub async fn run_test_questions(
    assistant: &Assistant,
    session: &mut Session,
    config: &TestDataConfig,
) -> Result<TestReport> {
    let (notice, paths) = match scan_test_folder(config)? {
        TestFolder::Found(paths) => (None, paths),
        other => {
            let notice = other.notice().unwrap_or(EMPTY_FOLDER_NOTICE);
            info!(folder = %config.folder.display(), notice, "test folder unusable");
            (Some(notice), Vec::new())
        }
    };

    let ingest = if paths.is_empty() {
        None
    } else {
        let docs = paths
            .iter()
            .map(|p| UploadedDocument::from_path(p))
            .collect::<Result<Vec<_>>>()?;
        Some(ingest_uploads(assistant, session, &docs).await?)
    };

    let mut exchanges = Vec::with_capacity(config.questions.len());
    for question in &config.questions {
        let outcome = assistant.answer(session, question).await?;
        exchanges.push(TestExchange {
            question: question.clone(),
            answer: outcome.message().to_string(),
            sentinel: matches!(
                outcome,
                AnswerOutcome::NeedsDocuments | AnswerOutcome::RateLimited
            ),
        });
    }

    let history_messages = session
        .conversation()
        .map(|c| c.history().message_count())
        .unwrap_or(0);
    info!(
        files = paths.len(),
        questions = exchanges.len(),
        history_messages,
        "test run finished"
    );

    Ok(TestReport {
        notice,
        files: paths.iter().map(|p| display_name(p)).collect(),
        ingest,
        exchanges,
        history_messages,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
