//! Terminal front-ends for the batch test mode and comparison mode.

use std::path::Path;

use anyhow::{Context, Result};
use pdf_chat_core::error::ComparisonError;
use pdf_chat_core::session::{FollowUp, Session};

use crate::assistant::build_assistant;
use crate::config::Config;
use crate::extract::{extract_text, UploadedDocument};
use crate::ingest::run_test_questions;

/// `pdf-chat run-tests`: ingest the test folder and print every answer.
///
/// A missing or empty folder prints its notice, then the (sentinel)
/// answers, and succeeds.
pub async fn run_tests(config: &Config) -> Result<()> {
    let assistant = build_assistant(config)?;
    let mut session = Session::default();

    let report = run_test_questions(&assistant, &mut session, &config.test_data).await?;
    if let Some(notice) = report.notice {
        println!("{}", notice);
    }
    if let Some(ingest) = &report.ingest {
        println!(
            "Ingested {} file(s): {} ({} chunks)",
            report.files.len(),
            report.files.join(", "),
            ingest.chunks
        );
    }
    println!();
    for exchange in &report.exchanges {
        println!("Q: {}", exchange.question);
        println!("A: {}", exchange.answer);
        println!();
    }
    println!("History: {} messages", report.history_messages);
    Ok(())
}

/// `pdf-chat compare`: run the comparison battery over a CV PDF and a
/// job-description text file.
pub async fn run_compare(config: &Config, cv_path: &Path, job_path: &Path) -> Result<()> {
    let cv = UploadedDocument::from_path(cv_path)?;
    let cv_text = extract_text(&cv)?;
    if cv_text.trim().is_empty() {
        return Err(ComparisonError::UnreadableCv)
            .with_context(|| format!("CV: {}", cv_path.display()));
    }
    let job_description = std::fs::read_to_string(job_path)
        .with_context(|| format!("Failed to read job description: {}", job_path.display()))?;

    let assistant = build_assistant(config)?;
    let mut session = Session::default();
    let report = assistant
        .compare(&mut session, &cv_text, &job_description)
        .await?;

    for (i, pair) in report.pairs.iter().enumerate() {
        println!("[{}] {}", i + 1, pair.prompt);
        println!("{}", pair.answer.trim());
        println!();
    }
    if let FollowUp::Failed(message) = &report.follow_up {
        println!("{}", message);
    }
    Ok(())
}
