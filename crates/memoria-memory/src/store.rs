// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector-backed persistence for memory records.
//!
//! Every record is one vector in the index: its id, the embedding of the
//! fact text, and metadata holding the owner, the text and timestamps.
//! All queries are scoped by a `user_id` equality filter, and results are
//! checked against the owner again before they leave this module.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use memoria_core::error::MemoriaError;
use memoria_core::traits::{EmbeddingAdapter, VectorIndex};
use memoria_core::types::{
    DeleteSelector, EmbeddingInput, Metadata, MetadataFilter, VectorQuery, VectorRecord,
    VectorUpdate,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::{content_hash, keys, MemoryRecord, ScoredMemory};

/// Memory store over an embedding adapter and a vector index.
pub struct MemoryStore {
    embedder: Arc<dyn EmbeddingAdapter>,
    index: Arc<dyn VectorIndex>,
    timeout: Duration,
    page_size: usize,
}

impl MemoryStore {
    pub fn new(
        embedder: Arc<dyn EmbeddingAdapter>,
        index: Arc<dyn VectorIndex>,
        timeout: Duration,
        page_size: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            timeout,
            page_size,
        }
    }

    /// Embed `text`, store it for `owner`, and return the new record.
    pub async fn add(
        &self,
        text: &str,
        owner: &str,
        metadata: Metadata,
    ) -> Result<MemoryRecord, MemoriaError> {
        let id = Uuid::new_v4().to_string();
        let values = self.embed(text, Some(&id)).await?;

        let record = MemoryRecord {
            id: id.clone(),
            text: text.to_string(),
            owner: owner.to_string(),
            hash: content_hash(text),
            created_at: Some(Utc::now()),
            updated_at: None,
            metadata,
        };
        let vector = VectorRecord {
            id: id.clone(),
            values,
            metadata: record.to_metadata(),
        };

        self.bounded(self.index.upsert(vec![vector])).await?;
        debug!(owner, record_id = %id, "memory added");
        Ok(record)
    }

    /// Replace the text of `id` in place. Id, owner and creation time are kept.
    ///
    /// Fails when the record is gone or belongs to someone else.
    pub async fn update(
        &self,
        id: &str,
        text: &str,
        owner: &str,
    ) -> Result<MemoryRecord, MemoriaError> {
        let mut record = self.owned_record("update", id, owner).await?.ok_or_else(|| {
            MemoriaError::storage("update", Some(id), "record no longer exists")
        })?;

        let values = self.embed(text, Some(id)).await?;
        let now = Utc::now();

        let mut set_metadata = Metadata::new();
        set_metadata.insert(keys::CONTENT.into(), text.into());
        set_metadata.insert(keys::HASH.into(), content_hash(text).into());
        set_metadata.insert(keys::UPDATED_AT.into(), now.to_rfc3339().into());

        self.bounded(self.index.update(VectorUpdate {
            id: id.to_string(),
            values: Some(values),
            set_metadata,
        }))
        .await?;

        record.text = text.to_string();
        record.hash = content_hash(text);
        record.updated_at = Some(now);
        debug!(owner, record_id = %id, "memory updated");
        Ok(record)
    }

    /// Delete `id` if it belongs to `owner`.
    ///
    /// Returns `false` when the record was already gone. A record owned by
    /// someone else is refused with an error.
    pub async fn delete(&self, id: &str, owner: &str) -> Result<bool, MemoriaError> {
        if self.owned_record("delete", id, owner).await?.is_none() {
            debug!(owner, record_id = %id, "delete target already gone");
            return Ok(false);
        }
        self.delete_by_id(id).await?;
        debug!(owner, record_id = %id, "memory deleted");
        Ok(true)
    }

    /// Delete one record by id without an ownership check.
    pub async fn delete_by_id(&self, id: &str) -> Result<(), MemoriaError> {
        self.bounded(self.index.delete(DeleteSelector::Ids(vec![id.to_string()])))
            .await
    }

    /// Delete every record owned by `owner`.
    pub async fn delete_by_owner(&self, owner: &str) -> Result<(), MemoriaError> {
        self.bounded(
            self.index
                .delete(DeleteSelector::Filter(owner_filter(owner))),
        )
        .await
    }

    /// Fetch one record by id.
    pub async fn get(&self, id: &str) -> Result<Option<MemoryRecord>, MemoriaError> {
        let fetched = self.bounded(self.index.fetch(&[id.to_string()])).await?;
        Ok(fetched
            .into_iter()
            .find(|v| v.id == id)
            .and_then(|v| MemoryRecord::from_metadata(v.id, v.metadata)))
    }

    /// Records of `owner` most similar to `query`, best first, all scoring
    /// at least `threshold`.
    pub async fn search(
        &self,
        query: &str,
        owner: &str,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ScoredMemory>, MemoriaError> {
        let vector = self.embed(query, None).await?;
        let matches = self
            .bounded(self.index.query(VectorQuery {
                vector: Some(vector),
                top_k: limit,
                filter: Some(owner_filter(owner)),
                include_metadata: true,
            }))
            .await?;

        Ok(matches
            .into_iter()
            .filter(|m| m.score >= threshold)
            .filter_map(|m| {
                let record = MemoryRecord::from_metadata(m.id, m.metadata)?;
                (record.owner == owner).then_some(ScoredMemory {
                    record,
                    score: m.score,
                })
            })
            .collect())
    }

    /// Every record of `owner`, up to the configured page size.
    pub async fn get_all_by_owner(&self, owner: &str) -> Result<Vec<MemoryRecord>, MemoriaError> {
        let matches = self
            .bounded(self.index.query(VectorQuery {
                vector: None,
                top_k: self.page_size,
                filter: Some(owner_filter(owner)),
                include_metadata: true,
            }))
            .await?;

        Ok(matches
            .into_iter()
            .filter_map(|m| MemoryRecord::from_metadata(m.id, m.metadata))
            .filter(|record| record.owner == owner)
            .collect())
    }

    /// Fetch `id` and check it belongs to `owner`. `Ok(None)` if it is gone.
    async fn owned_record(
        &self,
        operation: &'static str,
        id: &str,
        owner: &str,
    ) -> Result<Option<MemoryRecord>, MemoriaError> {
        let Some(record) = self.get(id).await? else {
            return Ok(None);
        };
        if record.owner != owner {
            warn!(owner, record_id = %id, operation, "refusing to touch a record of another owner");
            return Err(MemoriaError::storage(
                operation,
                Some(id),
                "record belongs to a different owner",
            ));
        }
        Ok(Some(record))
    }

    async fn embed(&self, text: &str, record_id: Option<&str>) -> Result<Vec<f32>, MemoriaError> {
        let output = self
            .bounded(self.embedder.embed(EmbeddingInput {
                texts: vec![text.to_string()],
            }))
            .await
            .map_err(|e| match e {
                timeout @ MemoriaError::Timeout { .. } => timeout,
                other => MemoriaError::Storage {
                    operation: "embed",
                    record_id: record_id.map(str::to_string),
                    message: other.to_string(),
                    source: Some(Box::new(other)),
                },
            })?;

        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| {
                MemoriaError::storage("embed", record_id, "embedding returned no vectors")
            })
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, MemoriaError>>,
    ) -> Result<T, MemoriaError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| MemoriaError::Timeout {
                duration: self.timeout,
            })?
    }
}

fn owner_filter(owner: &str) -> MetadataFilter {
    MetadataFilter::eq(keys::USER_ID, owner)
}
