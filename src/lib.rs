//! # PDF Chat
//!
//! Chat with your PDF documents. Uploaded PDFs are extracted, chunked,
//! embedded and indexed in memory; questions are answered by a hosted
//! language model using the most relevant chunks plus the conversation so
//! far.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  PDF upload │──▶│ Extract+Chunk│──▶│ Vector index │
//! │  test_data/ │   │   +Embed     │   │  (in memory) │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │
//!                         ┌───────────────────┤
//!                         ▼                   ▼
//!                  ┌────────────┐      ┌────────────┐
//!                  │  Session   │─────▶│ Chat model │
//!                  │ (history)  │      │  (OpenAI)  │
//!                  └─────┬──────┘      └────────────┘
//!                        ▼
//!                 ┌─────────────┐
//!                 │ HTTP UI/CLI │
//!                 └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! pdf-chat serve                                 # http://127.0.0.1:8501
//! pdf-chat run-tests                             # batch over ./test_data
//! pdf-chat compare --cv cv.pdf --job job.txt     # CV vs job description
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | PDF text extraction |
//! | [`embedding`] | OpenAI / Ollama embedding providers |
//! | [`llm`] | OpenAI-compatible chat model |
//! | [`assistant`] | Provider wiring |
//! | [`ingest`] | Upload ingestion and batch test mode |
//! | [`commands`] | Terminal output for `run-tests` and `compare` |
//! | [`server`] | HTTP chat UI |
//!
//! Chunking, the index, the session and rendering live in
//! [`pdf_chat_core`].

pub mod assistant;
pub mod commands;
pub mod config;
pub mod embedding;
pub mod extract;
mod http;
pub mod ingest;
pub mod llm;
pub mod server;
