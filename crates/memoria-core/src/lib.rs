// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Memoria memory service.
//!
//! This crate provides the trait definitions, error type, and shared types
//! used throughout the Memoria workspace. The provider, embedding, and
//! vector index adapters all implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MemoriaError;
pub use types::{ChatMessage, Metadata};

pub use traits::{EmbeddingAdapter, PluginAdapter, ProviderAdapter, VectorIndex};
