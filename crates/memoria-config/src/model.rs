// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Memoria memory service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Memoria configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Credentials have no defaults and are enforced by
/// validation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoriaConfig {
    /// HTTP server and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Pinecone vector index settings.
    #[serde(default)]
    pub pinecone: PineconeConfig,

    /// OpenRouter completion settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Embedding endpoint settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Trace export settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Retrieval and reconciliation tuning.
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Pinecone vector index configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PineconeConfig {
    /// Pinecone API key. Required.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Name of the index holding memory vectors. Required.
    #[serde(default)]
    pub index_name: Option<String>,

    /// Data-plane host. Resolved from the control plane when unset.
    #[serde(default)]
    pub index_host: Option<String>,

    /// Control-plane base URL.
    #[serde(default = "default_control_plane_url")]
    pub control_plane_url: String,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: None,
            index_host: None,
            control_plane_url: default_control_plane_url(),
        }
    }
}

impl std::fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("index_name", &self.index_name)
            .field("index_host", &self.index_host)
            .field("control_plane_url", &self.control_plane_url)
            .finish()
    }
}

fn default_control_plane_url() -> String {
    "https://api.pinecone.io".to_string()
}

/// OpenRouter chat completion configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenRouterConfig {
    /// OpenRouter API key. Required.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL (OpenAI-compatible).
    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,

    /// Model used for both extraction and reconciliation calls.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Sampling temperature for oracle calls.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate per oracle call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openrouter_base_url(),
            chat_model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl std::fmt::Debug for OpenRouterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_chat_model() -> String {
    "google/gemini-pro-1.5".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    512
}

/// Embedding endpoint configuration.
///
/// Falls back to the OpenRouter base URL and key when unset.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible base URL serving `/embeddings`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key for the embedding endpoint.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Embedding model identifier.
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: default_embedding_model(),
        }
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("model", &self.model)
            .finish()
    }
}

fn default_embedding_model() -> String {
    "openai/text-embedding-ada-002".to_string()
}

/// Trace export configuration (Langfuse-compatible OTLP endpoint).
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Export spans when the binary is built with the `otel` feature.
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    /// Public key. Required.
    #[serde(default)]
    pub public_key: Option<String>,

    /// Secret key. Required.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Telemetry host, e.g. `https://cloud.langfuse.com`. Required.
    #[serde(default)]
    pub host: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            public_key: None,
            secret_key: None,
            host: None,
        }
    }
}

impl std::fmt::Debug for TelemetryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryConfig")
            .field("enabled", &self.enabled)
            .field("public_key", &self.public_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[redacted]"))
            .field("host", &self.host)
            .finish()
    }
}

fn default_telemetry_enabled() -> bool {
    true
}

/// Retrieval and reconciliation tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Minimum similarity score for a match to count (0.0-1.0).
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    /// Maximum results returned by the search endpoint.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Maximum neighbors retrieved per fact during reconciliation.
    #[serde(default = "default_neighbor_limit")]
    pub neighbor_limit: usize,

    /// Cap on the deduplicated neighbor list shown to the oracle.
    #[serde(default = "default_max_neighbors")]
    pub max_neighbors: usize,

    /// Page size for listing all memories of an owner.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Timeout for a single oracle call, in seconds.
    #[serde(default = "default_oracle_timeout_secs")]
    pub oracle_timeout_secs: u64,

    /// Timeout for a single embed or index call, in seconds.
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
            search_limit: default_search_limit(),
            neighbor_limit: default_neighbor_limit(),
            max_neighbors: default_max_neighbors(),
            page_size: default_page_size(),
            oracle_timeout_secs: default_oracle_timeout_secs(),
            store_timeout_secs: default_store_timeout_secs(),
        }
    }
}

fn default_score_threshold() -> f32 {
    0.75
}

fn default_search_limit() -> usize {
    3
}

fn default_neighbor_limit() -> usize {
    3
}

fn default_max_neighbors() -> usize {
    20
}

fn default_page_size() -> usize {
    100
}

fn default_oracle_timeout_secs() -> u64 {
    60
}

fn default_store_timeout_secs() -> u64 {
    30
}
