// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Memoria integration tests.
//!
//! Provides mock adapters for fast, deterministic, CI-runnable tests
//! without an LLM provider, an embedding API, or a vector database.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock LLM provider with queued responses and request capture
//! - [`MockEmbedder`] - Deterministic bag-of-words embedder
//! - [`InMemoryIndex`] - Vector index with cosine search, `$eq` filters and failure injection

pub mod memory_index;
pub mod mock_embedder;
pub mod mock_provider;

pub use memory_index::InMemoryIndex;
pub use mock_embedder::MockEmbedder;
pub use mock_provider::MockProvider;
