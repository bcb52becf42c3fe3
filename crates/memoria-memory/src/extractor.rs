// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-based fact extraction from chat transcripts.
//!
//! One completion call per transcript. The model answers with
//! `{"fact": "..."}`; an empty string means nothing worth remembering.

use std::sync::Arc;

use memoria_core::error::MemoriaError;
use memoria_core::traits::ProviderAdapter;
use memoria_core::types::ChatMessage;
use serde_json::Value;
use tracing::{debug, warn};

use crate::oracle::{complete_bounded, OracleSettings};
use crate::parse::json_object_span;
use crate::prompts::fact_extraction_prompt;
use crate::types::Fact;

/// Extracts facts about the user from a conversation.
pub struct FactExtractor {
    provider: Arc<dyn ProviderAdapter>,
    settings: OracleSettings,
}

impl FactExtractor {
    pub fn new(provider: Arc<dyn ProviderAdapter>, settings: OracleSettings) -> Self {
        Self { provider, settings }
    }

    /// Extract facts from `transcript` on behalf of `owner`.
    ///
    /// Returns no facts without calling the model when nobody with the
    /// `user` role spoke. An unparseable answer is logged and yields no
    /// facts; a failed or timed-out call is an error.
    pub async fn extract(
        &self,
        transcript: &[ChatMessage],
        owner: &str,
        lang: Option<&str>,
    ) -> Result<Vec<Fact>, MemoriaError> {
        if !transcript.iter().any(ChatMessage::is_user) {
            debug!(owner, "transcript has no user messages, skipping extraction");
            return Ok(Vec::new());
        }

        let today = chrono::Utc::now().date_naive();
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(ChatMessage::system(fact_extraction_prompt(today, lang)));
        messages.extend(transcript.iter().cloned());

        let request = self.settings.request(messages, owner);
        let response =
            complete_bounded(self.provider.as_ref(), request, self.settings.timeout).await?;
        debug!(owner, raw = %response.content, "extraction response");

        match parse_fact_response(&response.content) {
            Ok(facts) => Ok(facts),
            Err(e) => {
                warn!(owner, error = %e, "discarding unparseable extraction response");
                Ok(Vec::new())
            }
        }
    }
}

/// Parse the extraction answer into facts.
///
/// Accepts `{"fact": "..."}` and `{"fact": ["...", ...]}`. Blank entries
/// are dropped, so `{"fact": ""}` is a valid answer with no facts.
pub fn parse_fact_response(response: &str) -> Result<Vec<Fact>, MemoriaError> {
    let value: Value = serde_json::from_str(json_object_span(response))
        .map_err(|e| MemoriaError::ExtractionParse(e.to_string()))?;

    let raw = match value.get("fact") {
        Some(Value::String(fact)) => vec![fact.as_str()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().ok_or_else(|| {
                    MemoriaError::ExtractionParse(format!("fact entry is not a string: {item}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(Value::Null) => Vec::new(),
        Some(other) => {
            return Err(MemoriaError::ExtractionParse(format!(
                "`fact` has unexpected type: {other}"
            )));
        }
        None => {
            return Err(MemoriaError::ExtractionParse(
                "response has no `fact` key".to_string(),
            ));
        }
    };

    Ok(raw
        .into_iter()
        .map(str::trim)
        .filter(|fact| !fact.is_empty())
        .map(str::to_string)
        .collect())
}
