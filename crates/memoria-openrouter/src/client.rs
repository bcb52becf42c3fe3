// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenRouter API.
//!
//! Provides [`OpenRouterClient`] which handles bearer authentication,
//! JSON request/response handling, and transient error retry.

use std::time::Duration;

use memoria_core::MemoriaError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{
    ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse, EmbeddingRequest,
    EmbeddingResponse,
};

/// Title sent with every request so calls are attributable on the OpenRouter dashboard.
const APP_TITLE: &str = "memoria";

/// HTTP client for OpenRouter (and other OpenAI-compatible endpoints).
///
/// Retries once after one second on 429, 500, 502 and 503.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl OpenRouterClient {
    /// Creates a client for `base_url` (e.g. `https://openrouter.ai/api/v1`).
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, MemoriaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                MemoriaError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("x-title", HeaderValue::from_static(APP_TITLE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MemoriaError::provider("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// `POST /chat/completions`.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, MemoriaError> {
        self.post_json("/chat/completions", request).await
    }

    /// `POST /embeddings`.
    pub async fn embeddings(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse, MemoriaError> {
        self.post_json("/embeddings", request).await
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, MemoriaError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, path, "retrying request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| MemoriaError::provider(format!("HTTP request failed: {e}"), e))?;

            let status = response.status();
            debug!(status = %status, attempt, path, "response received");

            if status.is_success() {
                let text = response.text().await.map_err(|e| {
                    MemoriaError::provider(format!("failed to read response body: {e}"), e)
                })?;
                return serde_json::from_str(&text).map_err(|e| {
                    MemoriaError::provider(format!("failed to parse API response: {e}"), e)
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(MemoriaError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            // Non-transient error or exhausted retries.
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => {
                    format!("OpenRouter API error ({status}): {}", api_err.error.message)
                }
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(MemoriaError::Provider {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| MemoriaError::Provider {
            message: "request failed after retries".into(),
            source: None,
        }))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApiMessage, ResponseFormat};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OpenRouterClient {
        OpenRouterClient::new("test-api-key", base_url, Duration::from_secs(10)).unwrap()
    }

    fn chat_request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "google/gemini-pro-1.5".into(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
            temperature: Some(0.3),
            max_tokens: 512,
            response_format: Some(ResponseFormat::json_object()),
            user: Some("alice".into()),
        }
    }

    fn chat_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "gen-1",
            "model": "google/gemini-pro-1.5",
            "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 4}
        })
    }

    #[tokio::test]
    async fn chat_completion_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "response_format": {"type": "json_object"},
                "user": "alice",
                "max_tokens": 512
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("{\"fact\": \"\"}")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let resp = client.chat_completion(&chat_request()).await.unwrap();
        assert_eq!(resp.id, "gen-1");
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("{\"fact\": \"\"}"));
        assert_eq!(resp.usage.unwrap().prompt_tokens, 12);
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("ok")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.chat_completion(&chat_request()).await;
        assert!(result.is_ok(), "headers should match: {result:?}");
    }

    #[tokio::test]
    async fn retries_once_on_502() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("after retry")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let resp = client.chat_completion(&chat_request()).await.unwrap();
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("after retry"));
    }

    #[tokio::test]
    async fn exhausts_retries_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit exceeded", "code": 429}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.chat_completion(&chat_request()).await.unwrap_err().to_string();
        assert!(err.contains("Rate limit exceeded"), "got: {err}");
    }

    #[tokio::test]
    async fn fails_fast_on_401() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "No auth credentials found", "code": 401}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.chat_completion(&chat_request()).await.unwrap_err().to_string();
        assert!(err.contains("No auth credentials found"), "got: {err}");
    }

    #[tokio::test]
    async fn embeddings_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(serde_json::json!({"input": ["a", "b"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"embedding": [0.1, 0.2], "index": 0},
                    {"embedding": [0.3, 0.4], "index": 1}
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&format!("{}/", server.uri()));
        let resp = client
            .embeddings(&EmbeddingRequest {
                model: "openai/text-embedding-ada-002".into(),
                input: vec!["a".into(), "b".into()],
            })
            .await
            .unwrap();
        assert_eq!(resp.data.len(), 2);
        assert_eq!(resp.data[1].embedding, vec![0.3, 0.4]);
    }
}
