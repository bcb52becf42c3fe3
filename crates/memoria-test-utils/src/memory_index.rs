// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process vector index for tests.
//!
//! Ranks by cosine similarity, honours `$eq` metadata filters, and can be
//! told to fail specific operations so error paths are reachable.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use memoria_core::traits::{PluginAdapter, VectorIndex};
use memoria_core::types::{
    DeleteSelector, VectorMatch, VectorQuery, VectorRecord, VectorUpdate,
};
use memoria_core::MemoriaError;

/// Vector index held in a `BTreeMap` so listing order is stable.
#[derive(Clone, Default)]
pub struct InMemoryIndex {
    records: Arc<RwLock<BTreeMap<String, VectorRecord>>>,
    failing_ops: Arc<Mutex<HashSet<&'static str>>>,
    failing_ids: Arc<Mutex<HashSet<String>>>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `operation` ("upsert", "query", "fetch", "update", "delete") fail.
    pub async fn fail_operation(&self, operation: &'static str) {
        self.failing_ops.lock().await.insert(operation);
    }

    /// Clear a failure previously set with [`fail_operation`](Self::fail_operation).
    pub async fn heal_operation(&self, operation: &'static str) {
        self.failing_ops.lock().await.remove(operation);
    }

    /// Make any write (upsert, update, delete by id) touching `id` fail.
    pub async fn fail_writes_for(&self, id: impl Into<String>) {
        self.failing_ids.lock().await.insert(id.into());
    }

    /// Number of successful mutating calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored record ordered by id.
    pub async fn records(&self) -> Vec<VectorRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// Insert a record directly, bypassing failure injection and the write counter.
    pub async fn seed(&self, record: VectorRecord) {
        self.records.write().await.insert(record.id.clone(), record);
    }

    async fn check(&self, operation: &'static str, ids: &[&str]) -> Result<(), MemoriaError> {
        if self.failing_ops.lock().await.contains(operation) {
            return Err(MemoriaError::storage(
                operation,
                ids.first().copied(),
                "injected failure",
            ));
        }
        let failing_ids = self.failing_ids.lock().await;
        if let Some(id) = ids.iter().find(|id| failing_ids.contains(**id)) {
            return Err(MemoriaError::storage(operation, Some(id), "injected failure"));
        }
        Ok(())
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl PluginAdapter for InMemoryIndex {
    fn name(&self) -> &str {
        "in-memory-index"
    }

    async fn shutdown(&self) -> Result<(), MemoriaError> {
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), MemoriaError> {
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        self.check("upsert", &ids).await?;

        let mut store = self.records.write().await;
        for record in records {
            store.insert(record.id.clone(), record);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query(&self, query: VectorQuery) -> Result<Vec<VectorMatch>, MemoriaError> {
        self.check("query", &[]).await?;

        let store = self.records.read().await;
        let mut matches: Vec<VectorMatch> = store
            .values()
            .filter(|r| query.filter.as_ref().is_none_or(|f| f.matches(&r.metadata)))
            .map(|r| VectorMatch {
                id: r.id.clone(),
                score: query
                    .vector
                    .as_deref()
                    .map_or(0.0, |v| cosine(v, &r.values)),
                metadata: if query.include_metadata {
                    r.metadata.clone()
                } else {
                    Default::default()
                },
            })
            .collect();

        if query.vector.is_some() {
            matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        }
        matches.truncate(query.top_k);
        Ok(matches)
    }

    async fn fetch(&self, ids: &[String]) -> Result<Vec<VectorRecord>, MemoriaError> {
        self.check("fetch", &[]).await?;

        let store = self.records.read().await;
        Ok(ids.iter().filter_map(|id| store.get(id).cloned()).collect())
    }

    async fn update(&self, update: VectorUpdate) -> Result<(), MemoriaError> {
        self.check("update", &[update.id.as_str()]).await?;

        let mut store = self.records.write().await;
        let record = store.get_mut(&update.id).ok_or_else(|| {
            MemoriaError::storage("update", Some(&update.id), "vector not found")
        })?;
        if let Some(values) = update.values {
            record.values = values;
        }
        for (key, value) in update.set_metadata {
            record.metadata.insert(key, value);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, selector: DeleteSelector) -> Result<(), MemoriaError> {
        match selector {
            DeleteSelector::Ids(ids) => {
                let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
                self.check("delete", &refs).await?;
                let mut store = self.records.write().await;
                for id in &ids {
                    store.remove(id);
                }
            }
            DeleteSelector::Filter(filter) => {
                self.check("delete", &[]).await?;
                self.records
                    .write()
                    .await
                    .retain(|_, r| !filter.matches(&r.metadata));
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
