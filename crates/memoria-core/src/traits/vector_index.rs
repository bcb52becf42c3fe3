// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector index trait for the persistence layer behind the memory store.

use async_trait::async_trait;

use crate::error::MemoriaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DeleteSelector, VectorMatch, VectorQuery, VectorRecord, VectorUpdate};

/// A vector-indexed store with metadata filtering.
///
/// Implementations guarantee per-id consistency only; there is no
/// multi-record transaction.
#[async_trait]
pub trait VectorIndex: PluginAdapter {
    /// Inserts or replaces vectors by id.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), MemoriaError>;

    /// Returns up to `top_k` matches ordered by descending score.
    async fn query(&self, query: VectorQuery) -> Result<Vec<VectorMatch>, MemoriaError>;

    /// Fetches vectors by id. Missing ids are omitted from the result.
    async fn fetch(&self, ids: &[String]) -> Result<Vec<VectorRecord>, MemoriaError>;

    /// Replaces values and/or metadata keys of an existing vector.
    async fn update(&self, update: VectorUpdate) -> Result<(), MemoriaError>;

    /// Deletes by explicit ids or by metadata filter.
    async fn delete(&self, selector: DeleteSelector) -> Result<(), MemoriaError>;
}
