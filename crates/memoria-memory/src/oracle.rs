// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The decision oracle: the language-model call that turns facts and
//! neighbors into ADD / UPDATE / DELETE / NONE proposals.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use memoria_core::error::MemoriaError;
use memoria_core::traits::ProviderAdapter;
use memoria_core::types::{ChatMessage, ProviderRequest, ProviderResponse};
use serde_json::Value;
use tracing::debug;

use crate::parse::json_object_span;
use crate::prompts::update_memory_prompt;
use crate::types::{Fact, MemoryEvent, NeighborEntry, ProposedDecision};

/// Model parameters shared by the extraction and reconciliation calls.
#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on a single completion call.
    pub timeout: Duration,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            model: "google/gemini-pro-1.5".to_string(),
            temperature: 0.3,
            max_tokens: 512,
            timeout: Duration::from_secs(60),
        }
    }
}

impl OracleSettings {
    /// A JSON-mode request for `messages`, tagged with `owner` for tracing.
    pub(crate) fn request(&self, messages: Vec<ChatMessage>, owner: &str) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(self.temperature),
            max_tokens: self.max_tokens,
            json_response: true,
            trace_user_id: Some(owner.to_string()),
        }
    }
}

/// Run one completion with the configured timeout.
pub(crate) async fn complete_bounded(
    provider: &dyn ProviderAdapter,
    request: ProviderRequest,
    timeout: Duration,
) -> Result<ProviderResponse, MemoriaError> {
    tokio::time::timeout(timeout, provider.complete(request))
        .await
        .map_err(|_| MemoriaError::Timeout { duration: timeout })?
}

/// Everything the oracle may see for one reconciliation.
#[derive(Debug, Clone)]
pub struct OracleContext {
    pub owner: String,
    /// Neighbors under their local ids.
    pub existing: Vec<NeighborEntry>,
    pub facts: Vec<Fact>,
}

/// Proposes memory decisions. Implementations must only reference local
/// ids from `context.existing` for UPDATE and DELETE; the reconciler
/// rejects anything else.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn propose(&self, context: &OracleContext)
        -> Result<Vec<ProposedDecision>, MemoriaError>;
}

/// Oracle backed by a chat completion provider.
pub struct ProviderOracle {
    provider: Arc<dyn ProviderAdapter>,
    settings: OracleSettings,
}

impl ProviderOracle {
    pub fn new(provider: Arc<dyn ProviderAdapter>, settings: OracleSettings) -> Self {
        Self { provider, settings }
    }
}

#[async_trait]
impl DecisionOracle for ProviderOracle {
    async fn propose(
        &self,
        context: &OracleContext,
    ) -> Result<Vec<ProposedDecision>, MemoriaError> {
        let prompt = update_memory_prompt(&context.existing, &context.facts);
        let request = self
            .settings
            .request(vec![ChatMessage::user(prompt)], &context.owner);

        let response =
            complete_bounded(self.provider.as_ref(), request, self.settings.timeout).await?;
        debug!(owner = %context.owner, raw = %response.content, "decision oracle response");
        parse_decision_response(&response.content)
    }
}

/// Strictly parse `{"memory": [{"id", "text", "event"}, ...]}`.
///
/// Code fences are tolerated and unknown fields ignored; anything
/// structurally wrong is a [`MemoriaError::Reconciliation`].
pub fn parse_decision_response(response: &str) -> Result<Vec<ProposedDecision>, MemoriaError> {
    let value: Value = serde_json::from_str(json_object_span(response))
        .map_err(|e| MemoriaError::Reconciliation(format!("response is not JSON: {e}")))?;

    let items = value
        .get("memory")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            MemoriaError::Reconciliation("response has no `memory` array".to_string())
        })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let field = |name: &str| {
                item.get(name).and_then(Value::as_str).ok_or_else(|| {
                    MemoriaError::Reconciliation(format!(
                        "memory[{index}].{name} is missing or not a string"
                    ))
                })
            };
            let id = field("id")?;
            let text = field("text")?;
            let label = field("event")?;
            let event = MemoryEvent::from_str(label).map_err(|_| {
                MemoriaError::Reconciliation(format!(
                    "memory[{index}] has unknown event `{label}`"
                ))
            })?;
            Ok(ProposedDecision::new(id, text, event))
        })
        .collect()
}
