// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The memory pipeline: extract, reconcile, apply, plus read and delete paths.

use std::sync::Arc;
use std::time::Duration;

use memoria_config::model::MemoriaConfig;
use memoria_core::error::MemoriaError;
use memoria_core::traits::{EmbeddingAdapter, ProviderAdapter, VectorIndex};
use tracing::{info, instrument, warn};

use crate::applier::MemoryApplier;
use crate::extractor::FactExtractor;
use crate::oracle::{DecisionOracle, OracleSettings, ProviderOracle};
use crate::reconciler::{MemoryReconciler, ReconcileSettings};
use crate::store::MemoryStore;
use crate::types::{AddMemoryOutcome, AddMemoryRequest, MemoryRecord, ScoredMemory};

/// Message returned when extraction finds nothing.
pub const NO_FACTS_MESSAGE: &str = "No facts to process";
/// Message returned after a completed pipeline run.
pub const PROCESSED_MESSAGE: &str = "Memory processed and stored successfully";

/// Tunables for the whole pipeline.
#[derive(Debug, Clone)]
pub struct MemorySettings {
    pub oracle: OracleSettings,
    pub reconcile: ReconcileSettings,
    /// Results returned by `search`.
    pub search_limit: usize,
    /// Records returned by `get_all`.
    pub page_size: usize,
    /// Upper bound on a single embed or index call.
    pub store_timeout: Duration,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            oracle: OracleSettings::default(),
            reconcile: ReconcileSettings::default(),
            search_limit: 3,
            page_size: 100,
            store_timeout: Duration::from_secs(30),
        }
    }
}

impl MemorySettings {
    pub fn from_config(config: &MemoriaConfig) -> Self {
        let memory = &config.memory;
        Self {
            oracle: OracleSettings {
                model: config.openrouter.chat_model.clone(),
                temperature: config.openrouter.temperature,
                max_tokens: config.openrouter.max_tokens,
                timeout: Duration::from_secs(memory.oracle_timeout_secs),
            },
            reconcile: ReconcileSettings {
                score_threshold: memory.score_threshold,
                neighbor_limit: memory.neighbor_limit,
                max_neighbors: memory.max_neighbors,
            },
            search_limit: memory.search_limit,
            page_size: memory.page_size,
            store_timeout: Duration::from_secs(memory.store_timeout_secs),
        }
    }
}

/// Entry point for everything the HTTP layer needs.
pub struct MemoryService {
    extractor: FactExtractor,
    reconciler: MemoryReconciler,
    applier: MemoryApplier,
    store: Arc<MemoryStore>,
    settings: MemorySettings,
}

impl MemoryService {
    /// Build the pipeline with the provider-backed decision oracle.
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        embedder: Arc<dyn EmbeddingAdapter>,
        index: Arc<dyn VectorIndex>,
        settings: MemorySettings,
    ) -> Self {
        let oracle = Arc::new(ProviderOracle::new(provider.clone(), settings.oracle.clone()));
        Self::with_oracle(provider, oracle, embedder, index, settings)
    }

    /// Build the pipeline with a custom decision oracle.
    pub fn with_oracle(
        provider: Arc<dyn ProviderAdapter>,
        oracle: Arc<dyn DecisionOracle>,
        embedder: Arc<dyn EmbeddingAdapter>,
        index: Arc<dyn VectorIndex>,
        settings: MemorySettings,
    ) -> Self {
        let store = Arc::new(MemoryStore::new(
            embedder,
            index,
            settings.store_timeout,
            settings.page_size,
        ));
        Self {
            extractor: FactExtractor::new(provider, settings.oracle.clone()),
            reconciler: MemoryReconciler::new(store.clone(), oracle, settings.reconcile),
            applier: MemoryApplier::new(store.clone()),
            store,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Extract facts from the transcript, reconcile them and apply the result.
    ///
    /// Extraction and reconciliation failures fail the request; failures of
    /// individual decisions only show up in the report.
    #[instrument(skip_all, fields(owner = %request.user_id))]
    pub async fn add_memory(
        &self,
        request: &AddMemoryRequest,
    ) -> Result<AddMemoryOutcome, MemoriaError> {
        info!(messages = request.messages.len(), "processing memory");
        let owner = request.user_id.as_str();

        let facts = self
            .extractor
            .extract(&request.messages, owner, request.lang.as_deref())
            .await?;
        if facts.is_empty() {
            info!("no facts extracted");
            return Ok(AddMemoryOutcome {
                message: NO_FACTS_MESSAGE.to_string(),
                facts,
                report: None,
            });
        }

        let decisions = self.reconciler.reconcile(&facts, owner).await?;
        let report = self.applier.apply(&decisions, owner).await;
        info!(
            facts = facts.len(),
            succeeded = report.succeeded(),
            failed = report.failed,
            "memory processed"
        );

        Ok(AddMemoryOutcome {
            message: PROCESSED_MESSAGE.to_string(),
            facts,
            report: Some(report),
        })
    }

    /// Similarity search within one owner's memory. Store errors yield no results.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, owner: &str) -> Vec<ScoredMemory> {
        let reconcile = &self.settings.reconcile;
        match self
            .store
            .search(query, owner, reconcile.score_threshold, self.settings.search_limit)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "memory search failed");
                Vec::new()
            }
        }
    }

    /// All of one owner's records. Store errors yield no results.
    #[instrument(skip(self))]
    pub async fn get_all(&self, owner: &str) -> Vec<MemoryRecord> {
        match self.store.get_all_by_owner(owner).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "listing memories failed");
                Vec::new()
            }
        }
    }

    /// Remove every record of `owner`.
    #[instrument(skip(self))]
    pub async fn delete_all(&self, owner: &str) -> Result<(), MemoriaError> {
        self.store.delete_by_owner(owner).await?;
        info!("deleted all memories");
        Ok(())
    }

    /// Remove one record regardless of owner.
    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: &str) -> Result<(), MemoriaError> {
        self.store.delete_by_id(id).await?;
        info!("deleted memory");
        Ok(())
    }
}
