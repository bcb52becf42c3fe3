// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `memoria serve` command: wires adapters into the memory service
//! and runs the HTTP gateway until a shutdown signal arrives.

use std::sync::Arc;

use memoria_config::MemoriaConfig;
use memoria_core::traits::PluginAdapter;
use memoria_core::MemoriaError;
use memoria_gateway::{start_server, GatewayState, ServerConfig};
use memoria_memory::{MemoryService, MemorySettings};
use memoria_openrouter::{OpenRouterEmbedder, OpenRouterProvider};
use memoria_pinecone::PineconeIndex;
use tracing::{debug, info, warn};

use crate::telemetry;

/// Runs the `memoria serve` command.
pub async fn run_serve(config: MemoriaConfig) -> Result<(), MemoriaError> {
    let telemetry = telemetry::init_tracing(&config);
    info!("starting memoria serve");

    let result = serve(&config).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "memoria serve failed");
    }

    telemetry.shutdown();
    result
}

async fn serve(config: &MemoriaConfig) -> Result<(), MemoriaError> {
    let provider = Arc::new(OpenRouterProvider::new(config)?);
    let embedder = Arc::new(OpenRouterEmbedder::new(config)?);
    let index = Arc::new(PineconeIndex::connect(config).await?);

    let service = MemoryService::new(
        provider.clone(),
        embedder.clone(),
        index.clone(),
        MemorySettings::from_config(config),
    );

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    start_server(
        &server_config,
        GatewayState::new(Arc::new(service)),
        shutdown_signal(),
    )
    .await?;

    let adapters: [&dyn PluginAdapter; 3] =
        [provider.as_ref(), embedder.as_ref(), index.as_ref()];
    for adapter in adapters {
        if let Err(e) = adapter.shutdown().await {
            warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
        }
    }

    info!("memoria serve shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                    _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                ctrl_c.await;
                info!("received SIGINT (Ctrl+C), initiating shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        info!("received Ctrl+C, initiating shutdown");
    }

    debug!("shutdown signal handler completed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serve_fails_fast_without_credentials() {
        let config = MemoriaConfig::default();
        let err = serve(&config).await.unwrap_err();
        assert!(matches!(err, MemoriaError::Config(_)), "got {err:?}");
    }
}
