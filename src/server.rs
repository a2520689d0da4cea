//! HTTP chat UI.
//!
//! Serves a single HTML page: a question box, the conversation rendered
//! with the chat-bubble templates (most recent turn first), an upload
//! sidebar with "Process" and "Run Tests", and a CV/job comparison form.
//! Every action is a plain form POST that runs to completion and returns
//! the re-rendered page.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Page with the current history |
//! | `POST` | `/ask` | Answer form field `query` |
//! | `POST` | `/process` | Ingest multipart `files` (PDFs) |
//! | `POST` | `/tests/run` | Batch test mode over the test folder |
//! | `POST` | `/compare` | Comparison over multipart `cv` + `job_description` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Missing input and unusable documents are shown inline on the page.
//! Anything else (extraction failures, provider errors, missing API key)
//! is a JSON error response:
//!
//! ```json
//! { "error": { "code": "internal", "message": "OPENAI_API_KEY environment variable not set" } }
//! ```
//!
//! The session lives in the shared state behind a `tokio::sync::Mutex`
//! held for the whole action, so concurrent requests are serialized.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Form, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pdf_chat_core::error::{is_rate_limited, ComparisonError, IngestError};
use pdf_chat_core::render::{
    block, render_history, render_pairs, MessageBlock, Speaker, CSS_TEMPLATE,
};
use pdf_chat_core::session::{AnswerOutcome, Assistant, FollowUp, Session, RATE_LIMIT_MESSAGE};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::assistant::build_assistant;
use crate::config::Config;
use crate::extract::{extract_text, ExtractError, UploadedDocument};
use crate::ingest::{ingest_uploads, run_test_questions};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    assistant: Arc<Assistant>,
    session: Arc<Mutex<Session>>,
}

impl AppState {
    /// State with an empty session.
    pub fn new(config: Config, assistant: Assistant) -> Self {
        Self {
            config: Arc::new(config),
            assistant: Arc::new(assistant),
            session: Arc::new(Mutex::new(Session::default())),
        }
    }
}

/// Build the router for `state`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(handle_index))
        .route("/ask", post(handle_ask))
        .route("/process", post(handle_process))
        .route("/tests/run", post(handle_run_tests))
        .route("/compare", post(handle_compare))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP UI on `[server].bind` with the configured providers.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let assistant = build_assistant(config)?;

    let bind_addr = config.server.bind.clone();
    let app = router(AppState::new(config.clone(), assistant));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(address = %bind_addr, "chat UI listening");
    println!("PDF Chat listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Converts into a JSON error response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    error!(error = %format!("{:#}", err), "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: format!("{:#}", err),
    }
}

/// Failures the page reports inline instead of failing the request.
fn inline_failure(err: anyhow::Error) -> Result<(StatusCode, Notice), AppError> {
    if let Some(e) = err.downcast_ref::<IngestError>() {
        return Ok((StatusCode::BAD_REQUEST, Notice::error(e.to_string())));
    }
    if let Some(e) = err.downcast_ref::<ComparisonError>() {
        return Ok((StatusCode::BAD_REQUEST, Notice::error(e.to_string())));
    }
    if is_rate_limited(&err) {
        return Ok((
            StatusCode::TOO_MANY_REQUESTS,
            Notice::error(RATE_LIMIT_MESSAGE),
        ));
    }
    Err(internal(err))
}

// ============ Page rendering ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoticeKind {
    Info,
    Error,
}

struct Notice {
    kind: NoticeKind,
    text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Default)]
struct Page {
    notice: Option<Notice>,
    query: String,
    blocks: Vec<MessageBlock>,
}

const PAGE_STYLE: &str = r#"
<style>
body { font-family: sans-serif; margin: 0; display: flex; background: #0e1117; color: #fafafa; }
aside { width: 20rem; padding: 1.5rem; background: #262730; min-height: 100vh; box-sizing: border-box; }
main { flex: 1; padding: 2rem 3rem; max-width: 60rem; }
form { margin-bottom: 1.5rem; }
input[type=text], textarea { width: 100%; padding: 0.5rem; box-sizing: border-box; }
button { margin-top: 0.5rem; padding: 0.4rem 1rem; }
.notice { padding: 0.75rem 1rem; border-radius: 0.5rem; margin-bottom: 1rem; }
.notice.info { background: #1c3d5a; }
.notice.error { background: #5a1c1c; }
</style>
"#;

fn render_page(page: &Page) -> String {
    let notice = page
        .notice
        .as_ref()
        .map(|n| {
            let class = match n.kind {
                NoticeKind::Info => "info",
                NoticeKind::Error => "error",
            };
            format!(
                r#"<div class="notice {}">{}</div>"#,
                class,
                escape_html(&n.text)
            )
        })
        .unwrap_or_default();

    let messages: String = page.blocks.iter().map(|b| b.html.as_str()).collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Chat with PDF</title>
{css}{style}
</head>
<body>
<aside>
  <h3>Your documents</h3>
  <form action="/process" method="post" enctype="multipart/form-data">
    <label>Upload your PDFs!<br><input type="file" name="files" accept="application/pdf" multiple></label><br>
    <button type="submit">Process</button>
  </form>
  <form action="/tests/run" method="post">
    <button type="submit">Run Tests</button>
  </form>
  <h3>Compare CV and Job</h3>
  <form action="/compare" method="post" enctype="multipart/form-data">
    <label>CV (PDF)<br><input type="file" name="cv" accept="application/pdf"></label><br>
    <label>Job description<br><textarea name="job_description" rows="8"></textarea></label><br>
    <button type="submit">Compare CV and Job</button>
  </form>
</aside>
<main>
  <h1>Chat with PDF</h1>
  <form action="/ask" method="post">
    <label>Ask questions about your PDFs:<br><input type="text" name="query" value="{query}"></label>
  </form>
  {notice}
  {messages}
</main>
</body>
</html>
"#,
        css = CSS_TEMPLATE,
        style = PAGE_STYLE,
        query = escape_html(&page.query),
        notice = notice,
        messages = messages,
    )
}

/// Escape text placed in the page shell. Message blocks are not escaped.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

type PageResult = Result<(StatusCode, Html<String>), AppError>;

fn respond(status: StatusCode, page: Page) -> PageResult {
    Ok((status, Html(render_page(&page))))
}

// ============ GET / ============

async fn handle_index(State(state): State<AppState>) -> PageResult {
    let session = state.session.lock().await;
    respond(
        StatusCode::OK,
        Page {
            blocks: render_history(session.turns()),
            ..Page::default()
        },
    )
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskForm {
    #[serde(default)]
    query: String,
}

async fn handle_ask(State(state): State<AppState>, Form(form): Form<AskForm>) -> PageResult {
    let mut session = state.session.lock().await;

    if form.query.trim().is_empty() {
        return respond(
            StatusCode::OK,
            Page {
                blocks: render_history(session.turns()),
                ..Page::default()
            },
        );
    }

    let outcome = state
        .assistant
        .answer(&mut session, &form.query)
        .await
        .map_err(internal)?;

    let blocks = match &outcome {
        AnswerOutcome::Answered(answer) => render_history(&answer.transcript),
        sentinel => {
            let mut blocks = vec![block(Speaker::Bot, sentinel.message())];
            blocks.extend(render_history(session.turns()));
            blocks
        }
    };

    respond(
        StatusCode::OK,
        Page {
            query: form.query,
            blocks,
            ..Page::default()
        },
    )
}

// ============ POST /process ============

/// Collect file parts named `field`; parts without a file name or bytes
/// (an empty file input) are skipped.
async fn read_files(
    multipart: &mut Multipart,
    field: &str,
) -> Result<(Vec<UploadedDocument>, Vec<(String, String)>), AppError> {
    let mut files = Vec::new();
    let mut text_fields = Vec::new();

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {}", e)))?
    {
        let name = part.name().unwrap_or_default().to_string();
        let file_name = part.file_name().map(str::to_string);
        let content_type = part.content_type().map(str::to_string);

        if name == field {
            let bytes = part
                .bytes()
                .await
                .map_err(|e| bad_request(format!("failed to read upload: {}", e)))?;
            let file_name = file_name.unwrap_or_default();
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }
            files.push(UploadedDocument {
                name: file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = part
                .text()
                .await
                .map_err(|e| bad_request(format!("failed to read field '{}': {}", name, e)))?;
            text_fields.push((name, value));
        }
    }

    Ok((files, text_fields))
}

async fn handle_process(State(state): State<AppState>, mut multipart: Multipart) -> PageResult {
    let (files, _) = read_files(&mut multipart, "files").await?;
    let mut session = state.session.lock().await;

    match ingest_uploads(&state.assistant, &mut session, &files).await {
        Ok(summary) => {
            let notice = Notice::info(format!(
                "Processed {} document(s) into {} chunks. Ask away!",
                summary.documents, summary.chunks
            ));
            respond(
                StatusCode::OK,
                Page {
                    notice: Some(notice),
                    ..Page::default()
                },
            )
        }
        Err(err) => {
            let (status, notice) = inline_failure(err)?;
            respond(
                status,
                Page {
                    notice: Some(notice),
                    blocks: render_history(session.turns()),
                    ..Page::default()
                },
            )
        }
    }
}

// ============ POST /tests/run ============

async fn handle_run_tests(State(state): State<AppState>) -> PageResult {
    let mut session = state.session.lock().await;

    let report = match run_test_questions(&state.assistant, &mut session, &state.config.test_data)
        .await
    {
        Ok(report) => report,
        Err(err) => {
            let (status, notice) = inline_failure(err)?;
            return respond(
                status,
                Page {
                    notice: Some(notice),
                    ..Page::default()
                },
            );
        }
    };

    let notice = match report.notice {
        Some(notice) => notice.to_string(),
        None => format!(
            "Ran {} test questions over {} file(s).",
            report.exchanges.len(),
            report.files.len()
        ),
    };
    // Sentinel answers never reach the history, so show the exchanges
    // themselves when nothing was answered from a session.
    let blocks = if session.turns().is_empty() {
        let pairs: Vec<(&str, &str)> = report
            .exchanges
            .iter()
            .map(|e| (e.question.as_str(), e.answer.as_str()))
            .collect();
        render_pairs(&pairs)
    } else {
        render_history(session.turns())
    };
    respond(
        StatusCode::OK,
        Page {
            notice: Some(Notice::info(notice)),
            blocks,
            ..Page::default()
        },
    )
}

// ============ POST /compare ============

async fn handle_compare(State(state): State<AppState>, mut multipart: Multipart) -> PageResult {
    let (files, fields) = read_files(&mut multipart, "cv").await?;
    let job_description = fields
        .into_iter()
        .find(|(name, _)| name == "job_description")
        .map(|(_, value)| value)
        .unwrap_or_default();

    let cv_text = match files.first() {
        Some(cv) => match extract_text(cv) {
            Ok(text) if text.trim().is_empty() => {
                return respond(
                    StatusCode::BAD_REQUEST,
                    Page {
                        notice: Some(Notice::error(ComparisonError::UnreadableCv.to_string())),
                        ..Page::default()
                    },
                )
            }
            Ok(text) => text,
            Err(e @ ExtractError::UnsupportedContentType { .. }) => {
                return respond(
                    StatusCode::BAD_REQUEST,
                    Page {
                        notice: Some(Notice::error(e.to_string())),
                        ..Page::default()
                    },
                )
            }
            Err(e) => return Err(internal(e.into())),
        },
        None => String::new(),
    };

    let mut session = state.session.lock().await;
    match state
        .assistant
        .compare(&mut session, &cv_text, &job_description)
        .await
    {
        Ok(report) => {
            let pairs: Vec<(&str, &str)> = report
                .pairs
                .iter()
                .map(|p| (p.prompt.as_str(), p.answer.as_str()))
                .collect();
            let notice = match report.follow_up {
                FollowUp::Skipped => None,
                FollowUp::Indexed(_) => Some(Notice::info(
                    "The CV and job description are indexed. Ask follow-up questions above.",
                )),
                FollowUp::Failed(message) => Some(Notice::error(message)),
            };
            respond(
                StatusCode::OK,
                Page {
                    notice,
                    blocks: render_pairs(&pairs),
                    ..Page::default()
                },
            )
        }
        Err(err) => {
            let (status, notice) = inline_failure(err)?;
            respond(
                status,
                Page {
                    notice: Some(notice),
                    ..Page::default()
                },
            )
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
