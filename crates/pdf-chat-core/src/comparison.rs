//! CV / job-description comparison battery.
//!
//! A fixed list of prompts is mapped over the same (CV, job description)
//! pair. Each prompt is an independent model call with no shared history,
//! and the results come back in prompt order.

use anyhow::Result;
use tracing::warn;

use crate::chat::{ChatModel, ChatRequest};
use crate::error::{ComparisonError, ProviderError};
use crate::prompt::comparison_messages;
use crate::session::RATE_LIMIT_MESSAGE;

/// Default comparison battery.
pub const DEFAULT_PROMPTS: [&str; 5] = [
    "Summarize the candidate's professional background in a few sentences.",
    "Which requirements of the job description does the candidate clearly meet?",
    "Which requirements of the job description are missing or weak in the CV?",
    "What are the candidate's strongest selling points for this role?",
    "On a scale of 1 to 10, how well does the candidate fit this job? Justify the score briefly.",
];

pub fn default_prompts() -> Vec<String> {
    DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect()
}

/// One prompt of the battery and the model's answer to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonPair {
    pub prompt: String,
    pub answer: String,
    /// The answer is the rate-limit sentinel, not model output.
    pub rate_limited: bool,
}

/// Check comparison inputs before any model call.
pub fn validate_inputs(cv_text: &str, job_description: &str) -> Result<(), ComparisonError> {
    if cv_text.trim().is_empty() {
        return Err(ComparisonError::MissingCv);
    }
    if job_description.trim().is_empty() {
        return Err(ComparisonError::MissingJobDescription);
    }
    Ok(())
}

/// Run every prompt against the CV and job description.
///
/// Returns exactly one pair per prompt, in prompt order. A throttled prompt
/// gets the rate-limit sentinel as its answer; other model failures abort.
pub async fn run_comparison(
    model: &dyn ChatModel,
    cv_text: &str,
    job_description: &str,
    prompts: &[String],
    temperature: f32,
) -> Result<Vec<ComparisonPair>> {
    validate_inputs(cv_text, job_description)?;

    let mut pairs = Vec::with_capacity(prompts.len());
    for prompt in prompts {
        let request = ChatRequest {
            messages: comparison_messages(cv_text, job_description, prompt),
            temperature,
        };
        let pair = match model.complete(&request).await {
            Ok(answer) => ComparisonPair {
                prompt: prompt.clone(),
                answer,
                rate_limited: false,
            },
            Err(ProviderError::RateLimited(detail)) => {
                warn!(prompt = %prompt, %detail, "comparison prompt rate limited");
                ComparisonPair {
                    prompt: prompt.clone(),
                    answer: RATE_LIMIT_MESSAGE.to_string(),
                    rate_limited: true,
                }
            }
            Err(ProviderError::Failed(e)) => return Err(e),
        };
        pairs.push(pair);
    }
    Ok(pairs)
}
