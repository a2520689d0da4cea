//! # PDF Chat Core
//!
//! Runtime-agnostic logic for PDF Chat: data models, the newline-aware
//! chunker, the embedding trait, the in-memory vector index, the chat model
//! trait, the conversation session with its bounded history, the CV/job
//! comparison battery, and the HTML chat templates.
//!
//! This crate contains no tokio, HTTP client, or filesystem I/O. Concrete
//! providers (OpenAI, Ollama) and PDF extraction live in the `pdf-chat`
//! application crate.
//!
//! ```text
//! text ──▶ chunk ──▶ embedding ──▶ index ──┐
//!                                          ▼
//!                 query ──▶ session (history + prompt) ──▶ ChatModel
//!                                          │
//!                                          ▼
//!                                       render
//! ```

pub mod chat;
pub mod chunk;
pub mod comparison;
pub mod embedding;
pub mod error;
pub mod history;
pub mod index;
pub mod models;
pub mod prompt;
pub mod render;
pub mod session;
