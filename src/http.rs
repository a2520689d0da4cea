//! JSON POST with retry and exponential backoff, shared by the embedding
//! providers and the chat client.
//!
//! - HTTP 429 and 5xx → retry
//! - other 4xx → fail immediately
//! - network errors → retry
//! - backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! When retries run out on a 429 the error is
//! [`ProviderError::RateLimited`], which the session turns into its
//! rate-limit sentinel.

use anyhow::anyhow;
use pdf_chat_core::error::ProviderError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// One provider endpoint.
pub(crate) struct JsonEndpoint<'a> {
    /// Name used in error messages (e.g. `"OpenAI"`).
    pub service: &'a str,
    pub url: String,
    pub api_key: Option<String>,
    pub max_retries: u32,
}

/// Build a client with the configured request timeout.
pub(crate) fn client(timeout_secs: u64) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ProviderError::Failed(e.into()))
}

/// Read an API key from the named environment variable.
pub(crate) fn api_key_from_env(var: &str) -> Result<String, ProviderError> {
    std::env::var(var)
        .map_err(|_| ProviderError::Failed(anyhow!("{} environment variable not set", var)))
}

/// POST `body` to `endpoint` and decode the JSON response.
pub(crate) async fn post_json<B, R>(
    client: &reqwest::Client,
    endpoint: &JsonEndpoint<'_>,
    body: &B,
) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let mut last_err = None;

    for attempt in 0..=endpoint.max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            debug!(service = endpoint.service, attempt, ?delay, "retrying request");
            tokio::time::sleep(delay).await;
        }

        let mut request = client.post(&endpoint.url).json(body);
        if let Some(key) = &endpoint.api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response.json::<R>().await.map_err(|e| {
                        ProviderError::Failed(anyhow!(
                            "Invalid {} response: {}",
                            endpoint.service,
                            e
                        ))
                    });
                }

                let body_text = response.text().await.unwrap_or_default();

                if status.as_u16() == 429 {
                    last_err = Some(ProviderError::RateLimited(format!(
                        "{} API error {}: {}",
                        endpoint.service, status, body_text
                    )));
                    continue;
                }

                if status.is_server_error() {
                    last_err = Some(ProviderError::Failed(anyhow!(
                        "{} API error {}: {}",
                        endpoint.service,
                        status,
                        body_text
                    )));
                    continue;
                }

                return Err(ProviderError::Failed(anyhow!(
                    "{} API error {}: {}",
                    endpoint.service,
                    status,
                    body_text
                )));
            }
            Err(e) => {
                last_err = Some(ProviderError::Failed(anyhow!(
                    "{} connection error ({}): {}",
                    endpoint.service,
                    endpoint.url,
                    e
                )));
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| {
        ProviderError::Failed(anyhow!("{} request failed after retries", endpoint.service))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    #[derive(serde::Deserialize)]
    struct Pong {
        ok: bool,
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn endpoint(url: String) -> JsonEndpoint<'static> {
        JsonEndpoint {
            service: "Test",
            url,
            api_key: Some("secret".to_string()),
            max_retries: 0,
        }
    }

    #[tokio::test]
    async fn test_success_is_decoded() {
        let base = serve(Router::new().route(
            "/ok",
            post(|| async { Json(serde_json::json!({ "ok": true })) }),
        ))
        .await;
        let pong: Pong = post_json(&client(5).unwrap(), &endpoint(format!("{base}/ok")), &())
            .await
            .unwrap();
        assert!(pong.ok);
    }

    #[tokio::test]
    async fn test_429_after_retries_is_rate_limited() {
        let base = serve(Router::new().route(
            "/busy",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        ))
        .await;
        let err = post_json::<_, Pong>(&client(5).unwrap(), &endpoint(format!("{base}/busy")), &())
            .await
            .err()
            .unwrap();
        assert!(err.is_rate_limited());
        assert!(err.to_string().contains("slow down"));
    }

    #[tokio::test]
    async fn test_client_error_fails_without_rate_limit() {
        let base = serve(Router::new().route(
            "/bad",
            post(|| async { (StatusCode::BAD_REQUEST, "bad model") }),
        ))
        .await;
        let err = post_json::<_, Pong>(&client(5).unwrap(), &endpoint(format!("{base}/bad")), &())
            .await
            .err()
            .unwrap();
        assert!(!err.is_rate_limited());
        assert!(err.to_string().contains("400"));
    }

    #[test]
    fn test_missing_env_var_names_it() {
        let err = api_key_from_env("PDF_CHAT_HTTP_TEST_KEY_NEVER_SET").unwrap_err();
        assert!(err.to_string().contains("PDF_CHAT_HTTP_TEST_KEY_NEVER_SET"));
    }
}
