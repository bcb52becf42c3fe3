// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenRouter adapters for Memoria.
//!
//! [`OpenRouterProvider`] implements [`ProviderAdapter`] over
//! `/chat/completions`; [`OpenRouterEmbedder`] implements
//! [`EmbeddingAdapter`] over `/embeddings`. Both speak the
//! OpenAI-compatible protocol, so the embedder can point at any
//! compatible endpoint through `[embedding] base_url`.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use memoria_config::MemoriaConfig;
use memoria_core::error::MemoriaError;
use memoria_core::traits::{EmbeddingAdapter, PluginAdapter, ProviderAdapter};
use memoria_core::types::{
    EmbeddingInput, EmbeddingOutput, ProviderRequest, ProviderResponse, TokenUsage,
};
use tracing::{debug, info};

use crate::client::OpenRouterClient;
use crate::types::{ApiMessage, ChatCompletionRequest, EmbeddingRequest, ResponseFormat};

/// HTTP-level timeout; the memory service applies its own, shorter bound per call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

fn require_key<'a>(key: &'a Option<String>, name: &str) -> Result<&'a str, MemoriaError> {
    key.as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| MemoriaError::Config(format!("{name} is not set")))
}

/// Chat completion provider backed by OpenRouter.
pub struct OpenRouterProvider {
    client: OpenRouterClient,
}

impl OpenRouterProvider {
    /// Creates a provider from `[openrouter]`.
    pub fn new(config: &MemoriaConfig) -> Result<Self, MemoriaError> {
        let api_key = require_key(&config.openrouter.api_key, "openrouter.api_key")?;
        let client = OpenRouterClient::new(api_key, &config.openrouter.base_url, HTTP_TIMEOUT)?;
        info!(
            model = config.openrouter.chat_model,
            "OpenRouter provider initialized"
        );
        Ok(Self { client })
    }

    /// Creates a provider with an existing client.
    pub fn with_client(client: OpenRouterClient) -> Self {
        Self { client }
    }

    fn to_chat_request(request: &ProviderRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.clone(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_response.then(ResponseFormat::json_object),
            user: request.trace_user_id.clone(),
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn shutdown(&self) -> Result<(), MemoriaError> {
        debug!("OpenRouter provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenRouterProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, MemoriaError> {
        let api_request = Self::to_chat_request(&request);
        let response = self.client.chat_completion(&api_request).await?;

        let choice = response.choices.into_iter().next().ok_or_else(|| MemoriaError::Provider {
            message: "completion returned no choices".to_string(),
            source: None,
        })?;
        let usage = response.usage.unwrap_or_default();

        Ok(ProviderResponse {
            id: response.id,
            content: choice.message.content.unwrap_or_default(),
            model: if response.model.is_empty() {
                request.model
            } else {
                response.model
            },
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }
}

/// Embedding adapter for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenRouterEmbedder {
    client: OpenRouterClient,
    model: String,
}

impl OpenRouterEmbedder {
    /// Creates an embedder from `[embedding]`, falling back to the
    /// `[openrouter]` endpoint and key when those are not set.
    pub fn new(config: &MemoriaConfig) -> Result<Self, MemoriaError> {
        let api_key = match &config.embedding.api_key {
            Some(key) if !key.trim().is_empty() => key.as_str(),
            _ => require_key(&config.openrouter.api_key, "openrouter.api_key")?,
        };
        let base_url = config
            .embedding
            .base_url
            .as_deref()
            .unwrap_or(&config.openrouter.base_url);
        let client = OpenRouterClient::new(api_key, base_url, HTTP_TIMEOUT)?;
        info!(model = config.embedding.model, base_url, "embedder initialized");
        Ok(Self::with_client(client, config.embedding.model.clone()))
    }

    pub fn with_client(client: OpenRouterClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl PluginAdapter for OpenRouterEmbedder {
    fn name(&self) -> &str {
        "openrouter-embedding"
    }

    async fn shutdown(&self) -> Result<(), MemoriaError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenRouterEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MemoriaError> {
        let expected = input.texts.len();
        let response = self
            .client
            .embeddings(&EmbeddingRequest {
                model: self.model.clone(),
                input: input.texts,
            })
            .await?;

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        if data.len() != expected {
            return Err(MemoriaError::Provider {
                message: format!("expected {expected} embeddings, got {}", data.len()),
                source: None,
            });
        }

        let embeddings: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();
        let dimensions = embeddings.first().map_or(0, Vec::len);
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoria_core::ChatMessage;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(uri: &str) -> OpenRouterClient {
        OpenRouterClient::new("key", uri, Duration::from_secs(10)).unwrap()
    }

    fn provider_request(json: bool) -> ProviderRequest {
        ProviderRequest {
            model: "google/gemini-pro-1.5".into(),
            messages: vec![ChatMessage::system("rules"), ChatMessage::user("I like tea")],
            temperature: Some(0.3),
            max_tokens: 512,
            json_response: json,
            trace_user_id: Some("alice".into()),
        }
    }

    #[test]
    fn chat_request_maps_json_mode_and_user() {
        let req = OpenRouterProvider::to_chat_request(&provider_request(true));
        assert!(req.response_format.is_some());
        assert_eq!(req.user.as_deref(), Some("alice"));
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, "system");

        let req = OpenRouterProvider::to_chat_request(&provider_request(false));
        assert!(req.response_format.is_none());
    }

    #[test]
    fn provider_requires_api_key() {
        let config = MemoriaConfig::default();
        assert!(matches!(
            OpenRouterProvider::new(&config),
            Err(MemoriaError::Config(_))
        ));
    }

    #[tokio::test]
    async fn complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "gen-7",
                "model": "google/gemini-pro-1.5",
                "choices": [{"message": {"role": "assistant", "content": "{\"fact\": \"Likes tea\"}"}}],
                "usage": {"prompt_tokens": 30, "completion_tokens": 8}
            })))
            .mount(&server)
            .await;

        let provider = OpenRouterProvider::with_client(client(&server.uri()));
        let resp = provider.complete(provider_request(true)).await.unwrap();
        assert_eq!(resp.id, "gen-7");
        assert_eq!(resp.content, "{\"fact\": \"Likes tea\"}");
        assert_eq!(resp.usage.input_tokens, 30);
        assert_eq!(resp.usage.output_tokens, 8);
    }

    #[tokio::test]
    async fn complete_without_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let provider = OpenRouterProvider::with_client(client(&server.uri()));
        assert!(provider.complete(provider_request(true)).await.is_err());
    }

    #[tokio::test]
    async fn embed_orders_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(serde_json::json!({"model": "test-embed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"embedding": [0.0, 1.0, 0.0], "index": 1},
                    {"embedding": [1.0, 0.0, 0.0], "index": 0}
                ]
            })))
            .mount(&server)
            .await;

        let embedder = OpenRouterEmbedder::with_client(client(&server.uri()), "test-embed".into());
        let out = embedder
            .embed(EmbeddingInput {
                texts: vec!["first".into(), "second".into()],
            })
            .await
            .unwrap();
        assert_eq!(out.dimensions, 3);
        assert_eq!(out.embeddings[0], vec![1.0, 0.0, 0.0]);
        assert_eq!(out.embeddings[1], vec![0.0, 1.0, 0.0]);
    }

    #[tokio::test]
    async fn embed_count_mismatch_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .mount(&server)
            .await;

        let embedder = OpenRouterEmbedder::with_client(client(&server.uri()), "m".into());
        let err = embedder
            .embed(EmbeddingInput {
                texts: vec!["one".into()],
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expected 1 embeddings"));
    }

    #[test]
    fn embedder_falls_back_to_openrouter_settings() {
        let mut config = MemoriaConfig::default();
        config.openrouter.api_key = Some("or-key".into());
        assert!(OpenRouterEmbedder::new(&config).is_ok());

        config.openrouter.api_key = None;
        assert!(OpenRouterEmbedder::new(&config).is_err());
        config.embedding.api_key = Some("embed-key".into());
        assert!(OpenRouterEmbedder::new(&config).is_ok());
    }
}
