// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Memoria service.

use serde::{Deserialize, Serialize};

/// Open key-value metadata attached to a stored vector.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

// --- Provider types ---

/// A single chat message, as received from clients and sent to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker role: "system", "user", or "assistant".
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// True when this message was written by the human participant.
    pub fn is_user(&self) -> bool {
        self.role.eq_ignore_ascii_case("user")
    }
}

/// A single-shot completion request to an LLM provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Model identifier (provider-specific).
    pub model: String,
    /// Ordered conversation, system prompt included as a message.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Ask the provider to return a JSON object.
    pub json_response: bool,
    /// Owner id attached to the call for tracing.
    pub trace_user_id: Option<String>,
}

/// Token accounting returned by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A completed provider response.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Provider-assigned response id.
    pub id: String,
    /// Text of the first choice.
    pub content: String,
    /// Model that served the request.
    pub model: String,
    /// Token usage, zeroed when the provider does not report it.
    pub usage: TokenUsage,
}

// --- Embedding types ---

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter, one vector per input text.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}

// --- Vector index types ---

/// Equality filter on one metadata field, serialized as `{field: {"$eq": value}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFilter {
    pub field: String,
    pub value: serde_json::Value,
}

impl MetadataFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Wire representation understood by the vector index.
    pub fn to_json(&self) -> serde_json::Value {
        let mut filter = serde_json::Map::new();
        filter.insert(
            self.field.clone(),
            serde_json::json!({ "$eq": self.value }),
        );
        serde_json::Value::Object(filter)
    }

    /// Whether `metadata` satisfies this filter.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        metadata.get(&self.field) == Some(&self.value)
    }
}

/// A vector with its id and metadata, as upserted or fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Metadata,
}

/// A nearest-neighbor query. `vector: None` lists filtered records without ranking.
#[derive(Debug, Clone)]
pub struct VectorQuery {
    pub vector: Option<Vec<f32>>,
    pub top_k: usize,
    pub filter: Option<MetadataFilter>,
    pub include_metadata: bool,
}

/// A scored query match.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Metadata,
}

/// In-place update of one vector: optional new values plus metadata keys to overwrite.
#[derive(Debug, Clone)]
pub struct VectorUpdate {
    pub id: String,
    pub values: Option<Vec<f32>>,
    pub set_metadata: Metadata,
}

/// Selects vectors to delete.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteSelector {
    Ids(Vec<String>),
    Filter(MetadataFilter),
}
