// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the memory REST API.
//!
//! Business failures are answered with 200 and `"status": "error"`;
//! only malformed bodies get axum's own rejection.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use memoria_memory::{AddMemoryRequest, ApplyReport};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::server::GatewayState;

/// Outcome marker carried by every API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Response envelope shared by the memory routes.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: Option<String>, results: Option<T>) -> Self {
        Self {
            status: Status::Success,
            message,
            results,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            results: None,
        }
    }
}

/// Response body for POST /api/v1/memory/.
#[derive(Debug, Serialize)]
pub struct AddMemoryResponse {
    pub status: Status,
    pub message: String,
    /// Facts extracted from the transcript.
    pub results: Vec<String>,
    /// Per-event counts; absent when nothing was reconciled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ApplyReport>,
}

/// Query string of GET /api/v1/memory/{user_id}.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// POST /api/v1/memory/
///
/// Runs the extract, reconcile, apply pipeline for one transcript.
pub async fn add_memory(
    State(state): State<GatewayState>,
    Json(body): Json<AddMemoryRequest>,
) -> Response {
    info!(owner = %body.user_id, "processing memory");
    match state.service.add_memory(&body).await {
        Ok(outcome) => Json(AddMemoryResponse {
            status: Status::Success,
            message: outcome.message,
            results: outcome.facts,
            report: outcome.report,
        })
        .into_response(),
        Err(e) => {
            error!(owner = %body.user_id, error = %e, "error processing memory");
            Json(ApiResponse::error(e.to_string())).into_response()
        }
    }
}

/// GET /api/v1/memory/{user_id}?query=...
///
/// Searches the owner's memories, or lists all of them when `query` is absent.
pub async fn search_memory(
    State(state): State<GatewayState>,
    Path(user_id): Path<String>,
    Query(params): Query<SearchParams>,
) -> Response {
    match params.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => {
            info!(owner = %user_id, query, "searching memory");
            let results = state.service.search(query, &user_id).await;
            info!(owner = %user_id, results = results.len(), "memory search completed");
            Json(ApiResponse::success(None, Some(results))).into_response()
        }
        None => {
            info!(owner = %user_id, "listing memories");
            let results = state.service.get_all(&user_id).await;
            Json(ApiResponse::success(None, Some(results))).into_response()
        }
    }
}

/// DELETE /api/v1/memory/{user_id}
pub async fn delete_memories(
    State(state): State<GatewayState>,
    Path(user_id): Path<String>,
) -> Response {
    info!(owner = %user_id, "deleting all memories");
    match state.service.delete_all(&user_id).await {
        Ok(()) => Json(ApiResponse::success(
            Some("Successfully deleted all memories".to_string()),
            Some(String::new()),
        ))
        .into_response(),
        Err(e) => {
            error!(owner = %user_id, error = %e, "error deleting memories");
            Json(ApiResponse::error(e.to_string())).into_response()
        }
    }
}

/// DELETE /api/v1/memory/id/{id}
pub async fn delete_memory_by_id(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Response {
    info!(record_id = %id, "deleting memory by id");
    match state.service.delete_by_id(&id).await {
        Ok(()) => Json(ApiResponse::<()>::success(
            Some(format!("Successfully deleted memory by id: {id}")),
            None,
        ))
        .into_response(),
        Err(e) => {
            error!(record_id = %id, error = %e, "error deleting memory by id");
            Json(ApiResponse::error(e.to_string())).into_response()
        }
    }
}

/// GET /health
///
/// Liveness only; no dependency is checked.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
