//! HTTP UI tests: an in-process server on an ephemeral port, driven with
//! reqwest and backed by fake providers.

mod common;

use std::fs;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{fake_assistant, minimal_pdf, EchoModel};
use pdf_chat::config::Config;
use pdf_chat::server::{router, AppState};
use pdf_chat_core::session::{NO_SESSION_MESSAGE, RATE_LIMIT_MESSAGE};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use tempfile::TempDir;

struct TestServer {
    base: String,
    model: Arc<EchoModel>,
    client: reqwest::Client,
}

async fn start(config: Config) -> TestServer {
    let fakes = fake_assistant(&config);
    let app = router(AppState::new(config, fakes.assistant));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://{}", addr),
        model: fakes.model,
        client: reqwest::Client::new(),
    }
}

impl TestServer {
    async fn ask(&self, query: &str) -> (StatusCode, String) {
        let resp = self
            .client
            .post(format!("{}/ask", self.base))
            .form(&[("query", query)])
            .send()
            .await
            .unwrap();
        (resp.status(), resp.text().await.unwrap())
    }

    async fn upload(&self, files: &[(&str, Vec<u8>)]) -> (StatusCode, String) {
        let mut form = Form::new();
        for (name, bytes) in files {
            let part = Part::bytes(bytes.clone())
                .file_name(name.to_string())
                .mime_str("application/pdf")
                .unwrap();
            form = form.part("files", part);
        }
        let resp = self
            .client
            .post(format!("{}/process", self.base))
            .multipart(form)
            .send()
            .await
            .unwrap();
        (resp.status(), resp.text().await.unwrap())
    }
}

#[tokio::test]
async fn test_health() {
    let server = start(Config::default()).await;
    let body: serde_json::Value = server
        .client
        .get(format!("{}/health", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_index_renders_shell() {
    let server = start(Config::default()).await;
    let html = server
        .client
        .get(format!("{}/", server.base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Chat with PDF"));
    assert!(html.contains("Ask questions about your PDFs:"));
    assert!(html.contains("Run Tests"));
    assert!(html.contains(".chat-message"));
}

#[tokio::test]
async fn test_ask_before_upload_shows_sentinel() {
    let server = start(Config::default()).await;
    let (status, html) = server.ask("Who is Andrii Mikita?").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(NO_SESSION_MESSAGE));
    assert_eq!(server.model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_blank_query_does_not_ask() {
    let server = start(Config::default()).await;
    let (status, html) = server.ask("   ").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!html.contains(NO_SESSION_MESSAGE));
}

#[tokio::test]
async fn test_upload_then_ask_renders_history_most_recent_first() {
    let server = start(Config::default()).await;
    let (status, html) = server
        .upload(&[
            ("a.pdf", minimal_pdf("Stripe builds payment infrastructure")),
            ("b.pdf", minimal_pdf("Coffee machines need rinsing")),
        ])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Processed 2 document"));

    server.ask("first question").await;
    let (_, html) = server.ask("second question").await;

    let second = html.find("answer to: second question").unwrap();
    let first = html.find("answer to: first question").unwrap();
    assert!(second < first);
}

#[tokio::test]
async fn test_upload_without_files_is_inline_error() {
    let server = start(Config::default()).await;
    // A browser submits an empty file part when nothing was chosen.
    let (status, html) = server.upload(&[("", Vec::new())]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(html.contains("No documents found"));
}

#[tokio::test]
async fn test_rate_limit_renders_sentinel() {
    let server = start(Config::default()).await;
    server
        .upload(&[("a.pdf", minimal_pdf("Some document text"))])
        .await;
    server.model.throttled.store(true, Ordering::SeqCst);

    let (status, html) = server.ask("anything").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(RATE_LIMIT_MESSAGE));
}

#[tokio::test]
async fn test_model_failure_is_json_error() {
    let server = start(Config::default()).await;
    server
        .upload(&[("a.pdf", minimal_pdf("Some document text"))])
        .await;
    server.model.broken.store(true, Ordering::SeqCst);

    let resp = server
        .client
        .post(format!("{}/ask", server.base))
        .form(&[("query", "anything")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "internal");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("model backend unavailable"));
}

#[tokio::test]
async fn test_run_tests_with_missing_folder() {
    let tmp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.test_data.folder = tmp.path().join("test_data");
    let server = start(config).await;

    let html = server
        .client
        .post(format!("{}/tests/run", server.base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("The &#39;test_data&#39; folder does not exist."));
    // The questions are still asked; with nothing uploaded each gets the sentinel.
    assert!(html.contains("Who is Andrii Mikita?"));
    assert_eq!(html.matches(NO_SESSION_MESSAGE).count(), 6);
    assert_eq!(server.model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_run_tests_over_folder() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("doc.pdf"), minimal_pdf("Stripe is a payments company")).unwrap();
    let mut config = Config::default();
    config.test_data.folder = tmp.path().to_path_buf();
    let server = start(config).await;

    let html = server
        .client
        .post(format!("{}/tests/run", server.base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Ran 6 test questions over 1 file(s)."));
    assert!(html.contains("What does Stripe company do?"));
}

#[tokio::test]
async fn test_compare_requires_job_description() {
    let server = start(Config::default()).await;
    let form = Form::new()
        .part(
            "cv",
            Part::bytes(minimal_pdf("Senior Rust engineer"))
                .file_name("cv.pdf")
                .mime_str("application/pdf")
                .unwrap(),
        )
        .text("job_description", "");
    let resp = server
        .client
        .post(format!("{}/compare", server.base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.text().await.unwrap().contains("Please enter a job description."));
    assert_eq!(server.model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_compare_renders_pairs_in_order() {
    let mut config = Config::default();
    config.comparison.prompts = vec!["First prompt".to_string(), "Second prompt".to_string()];
    let server = start(config).await;

    let form = Form::new()
        .part(
            "cv",
            Part::bytes(minimal_pdf("Senior Rust engineer"))
                .file_name("cv.pdf")
                .mime_str("application/pdf")
                .unwrap(),
        )
        .text("job_description", "Hiring a Rust engineer");
    let resp = server
        .client
        .post(format!("{}/compare", server.base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();

    let first = html.find("answer to: First prompt").unwrap();
    let second = html.find("answer to: Second prompt").unwrap();
    assert!(first < second);
    assert_eq!(server.model.calls.load(Ordering::SeqCst), 2);

    // Stateless by default: the chat still has no documents.
    let (_, html) = server.ask("Is the candidate senior?").await;
    assert!(html.contains(NO_SESSION_MESSAGE));
}

#[tokio::test]
async fn test_compare_with_textless_cv_says_so() {
    let server = start(Config::default()).await;
    let form = Form::new()
        .part(
            "cv",
            Part::bytes(minimal_pdf(""))
                .file_name("scan.pdf")
                .mime_str("application/pdf")
                .unwrap(),
        )
        .text("job_description", "Hiring a Rust engineer");
    let resp = server
        .client
        .post(format!("{}/compare", server.base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let html = resp.text().await.unwrap();
    assert!(html.contains("No text could be extracted from the CV."));
    assert!(!html.contains("Please upload a CV."));
    assert_eq!(server.model.calls.load(Ordering::SeqCst), 0);
}
