// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pinecone vector index adapter for Memoria.
//!
//! [`PineconeIndex`] implements [`VectorIndex`] against the Pinecone REST
//! data plane. The index host and dimension are resolved from the control
//! plane at startup unless `pinecone.index_host` pins the host.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use memoria_config::MemoriaConfig;
use memoria_core::error::MemoriaError;
use memoria_core::traits::{PluginAdapter, VectorIndex};
use memoria_core::types::{
    DeleteSelector, VectorMatch, VectorQuery, VectorRecord, VectorUpdate,
};
use tracing::{debug, info};

use crate::client::PineconeClient;
use crate::types::{DeleteRequest, QueryRequest, UpdateRequest, UpsertRequest, Vector};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Vector index backed by a single Pinecone index.
pub struct PineconeIndex {
    client: PineconeClient,
    dimension: usize,
}

impl PineconeIndex {
    /// Connects using `[pinecone]`, describing the index on the control plane.
    pub async fn connect(config: &MemoriaConfig) -> Result<Self, MemoriaError> {
        let api_key = config
            .pinecone
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| MemoriaError::Config("pinecone.api_key is not set".into()))?;
        let index_name = config
            .pinecone
            .index_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| MemoriaError::Config("pinecone.index_name is not set".into()))?;

        let description = client::describe_index(
            api_key,
            &config.pinecone.control_plane_url,
            index_name,
            HTTP_TIMEOUT,
        )
        .await?;
        let host = config
            .pinecone
            .index_host
            .as_deref()
            .unwrap_or(&description.host);

        let client = PineconeClient::new(api_key, host, HTTP_TIMEOUT)?;
        info!(
            index = index_name,
            host = client.host(),
            dimension = description.dimension,
            "Pinecone index connected"
        );
        Ok(Self::with_client(client, description.dimension))
    }

    /// Creates an index adapter with an existing client and known dimension.
    pub fn with_client(client: PineconeClient, dimension: usize) -> Self {
        Self { client, dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Stand-in vector for unranked listing; Pinecone requires one per query.
    fn listing_vector(&self) -> Vec<f32> {
        let d = self.dimension.max(1);
        vec![1.0 / (d as f32).sqrt(); d]
    }
}

#[async_trait]
impl PluginAdapter for PineconeIndex {
    fn name(&self) -> &str {
        "pinecone"
    }

    async fn shutdown(&self) -> Result<(), MemoriaError> {
        debug!("Pinecone index shutting down");
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), MemoriaError> {
        if records.is_empty() {
            return Ok(());
        }
        let vectors = records
            .into_iter()
            .map(|r| Vector {
                id: r.id,
                values: r.values,
                metadata: Some(r.metadata),
            })
            .collect();
        let response = self.client.upsert(&UpsertRequest { vectors }).await?;
        debug!(count = response.upserted_count, "vectors upserted");
        Ok(())
    }

    async fn query(&self, query: VectorQuery) -> Result<Vec<VectorMatch>, MemoriaError> {
        let request = QueryRequest {
            vector: query.vector.unwrap_or_else(|| self.listing_vector()),
            top_k: query.top_k,
            filter: query.filter.as_ref().map(|f| f.to_json()),
            include_metadata: query.include_metadata,
            include_values: false,
        };
        let response = self.client.query(&request).await?;
        Ok(response
            .matches
            .into_iter()
            .map(|m| VectorMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata.unwrap_or_default(),
            })
            .collect())
    }

    async fn fetch(&self, ids: &[String]) -> Result<Vec<VectorRecord>, MemoriaError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut response = self.client.fetch(ids).await?;
        // keep request order; the response is a map
        Ok(ids
            .iter()
            .filter_map(|id| response.vectors.remove(id))
            .map(|v| VectorRecord {
                id: v.id,
                values: v.values,
                metadata: v.metadata.unwrap_or_default(),
            })
            .collect())
    }

    async fn update(&self, update: VectorUpdate) -> Result<(), MemoriaError> {
        let set_metadata = (!update.set_metadata.is_empty()).then_some(update.set_metadata);
        self.client
            .update(&UpdateRequest {
                id: update.id,
                values: update.values,
                set_metadata,
            })
            .await
    }

    async fn delete(&self, selector: DeleteSelector) -> Result<(), MemoriaError> {
        let request = match selector {
            DeleteSelector::Ids(ids) if ids.is_empty() => return Ok(()),
            DeleteSelector::Ids(ids) => DeleteRequest {
                ids: Some(ids),
                filter: None,
            },
            DeleteSelector::Filter(filter) => DeleteRequest {
                ids: None,
                filter: Some(filter.to_json()),
            },
        };
        self.client.delete(&request).await
    }
}
