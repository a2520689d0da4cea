//! Prompt construction for retrieval answers, question condensing, and
//! CV/job comparison.

use crate::chat::ChatMessage;
use crate::models::{RetrievedChunk, Turn};

const ANSWER_INSTRUCTIONS: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

const CONDENSE_INSTRUCTIONS: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language.";

const COMPARISON_INSTRUCTIONS: &str = "You are an experienced recruiter reviewing a candidate. \
Answer using only the CV and the job description below. Be specific and concise.";

const HUMAN_PREFIX: &str = "You";
const AI_PREFIX: &str = "AI";

/// Messages for a retrieval-augmented answer: context in the system
/// message, the full history as alternating turns, then the question.
pub fn answer_messages(
    context: &[RetrievedChunk],
    history: &[Turn],
    question: &str,
) -> Vec<ChatMessage> {
    let context_block = context
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatMessage::system(format!(
        "{}\n\n{}",
        ANSWER_INSTRUCTIONS, context_block
    )));
    for turn in history {
        messages.push(ChatMessage::user(turn.question.clone()));
        messages.push(ChatMessage::assistant(turn.answer.clone()));
    }
    messages.push(ChatMessage::user(question.to_string()));
    messages
}

/// Single-message prompt asking the model to turn a follow-up into a
/// standalone question.
pub fn condense_messages(history: &[Turn], question: &str) -> Vec<ChatMessage> {
    let transcript = history
        .iter()
        .map(|t| {
            format!(
                "{}: {}\n{}: {}",
                HUMAN_PREFIX, t.question, AI_PREFIX, t.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    vec![ChatMessage::user(format!(
        "{}\n\nChat History:\n{}\nFollow Up Input: {}\nStandalone question:",
        CONDENSE_INSTRUCTIONS, transcript, question
    ))]
}

/// Messages for one prompt of the comparison battery.
pub fn comparison_messages(cv_text: &str, job_description: &str, prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "{}\n\nCV:\n{}\n\nJob description:\n{}",
            COMPARISON_INSTRUCTIONS, cv_text, job_description
        )),
        ChatMessage::user(prompt.to_string()),
    ]
}
