// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic embedding adapter for tests.
//!
//! Texts become L2-normalized bag-of-words vectors: identical texts score
//! exactly 1.0, texts sharing most words score high, unrelated texts near 0.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use memoria_core::traits::{EmbeddingAdapter, PluginAdapter};
use memoria_core::types::{EmbeddingInput, EmbeddingOutput};
use memoria_core::MemoriaError;

/// Dimension of mock embeddings.
pub const MOCK_DIM: usize = 64;

/// Embeds text by hashing lowercase word tokens into [`MOCK_DIM`] buckets.
pub struct MockEmbedder {
    failing: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            failing: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Make embedding of exactly `text` fail.
    pub async fn fail_on(&self, text: impl Into<String>) {
        self.failing.lock().await.insert(text.into());
    }

    /// Number of `embed` calls received.
    pub async fn call_count(&self) -> usize {
        *self.calls.lock().await
    }

    /// Embed one text synchronously.
    pub fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; MOCK_DIM];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = fnv1a(&token.to_lowercase()) as usize % MOCK_DIM;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        } else {
            // keep empty text away from the zero vector
            vector[0] = 1.0;
        }
        vector
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    async fn shutdown(&self) -> Result<(), MemoriaError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MemoriaError> {
        *self.calls.lock().await += 1;

        let failing = self.failing.lock().await;
        if let Some(text) = input.texts.iter().find(|t| failing.contains(*t)) {
            return Err(MemoriaError::Provider {
                message: format!("mock embedding failure for `{text}`"),
                source: None,
            });
        }

        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| Self::vector_for(t)).collect(),
            dimensions: MOCK_DIM,
        })
    }
}
