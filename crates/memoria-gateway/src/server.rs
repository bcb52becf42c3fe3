// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the memory API.

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use memoria_core::MemoriaError;
use memoria_memory::MemoryService;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub service: Arc<MemoryService>,
}

impl GatewayState {
    pub fn new(service: Arc<MemoryService>) -> Self {
        Self { service }
    }
}

/// Server bind address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the application router.
///
/// - POST /api/v1/memory/ (and without the trailing slash)
/// - GET /api/v1/memory/{user_id}
/// - DELETE /api/v1/memory/{user_id}
/// - DELETE /api/v1/memory/id/{id}
/// - GET /health
pub fn router(state: GatewayState) -> Router {
    let memory_routes = Router::new()
        .route("/api/v1/memory/", post(handlers::add_memory))
        .route("/api/v1/memory", post(handlers::add_memory))
        .route(
            "/api/v1/memory/{user_id}",
            get(handlers::search_memory).delete(handlers::delete_memories),
        )
        .route("/api/v1/memory/id/{id}", delete(handlers::delete_memory_by_id))
        .with_state(state);

    let public_routes = Router::new().route("/health", get(handlers::health));

    Router::new()
        .merge(public_routes)
        .merge(memory_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until `shutdown` resolves.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), MemoriaError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MemoriaError::Internal(format!("failed to bind server to {addr}: {e}")))?;

    tracing::info!("Memoria listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| MemoriaError::Internal(format!("server error: {e}")))?;

    tracing::info!("server stopped");
    Ok(())
}
