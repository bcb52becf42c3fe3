// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracing subscriber setup, with optional OTLP span export.

use memoria_config::model::MemoriaConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the span exporter alive; flush it with [`TelemetryGuard::shutdown`].
#[derive(Default)]
pub struct TelemetryGuard {
    #[cfg(feature = "otel")]
    provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
}

impl TelemetryGuard {
    pub fn shutdown(self) {
        #[cfg(feature = "otel")]
        if let Some(provider) = self.provider
            && let Err(e) = provider.shutdown()
        {
            eprintln!("memoria: failed to flush spans: {e}");
        }
    }
}

/// Default filter directive when `RUST_LOG` is unset.
pub fn default_directive(log_level: &str) -> String {
    format!("memoria={log_level},warn")
}

/// Initializes the global subscriber. `RUST_LOG` overrides `server.log_level`.
pub fn init_tracing(config: &MemoriaConfig) -> TelemetryGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.server.log_level)));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_names(false);

    #[cfg(feature = "otel")]
    {
        let provider = match otel::tracer_provider(&config.telemetry) {
            Ok(provider) => provider,
            Err(e) => {
                eprintln!("memoria: span export disabled: {e}");
                None
            }
        };
        let otel_layer = provider.as_ref().map(|provider| {
            use opentelemetry::trace::TracerProvider as _;
            tracing_opentelemetry::layer().with_tracer(provider.tracer("memoria"))
        });

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();

        if provider.is_some() {
            tracing::info!(
                endpoint = %otel::endpoint(config.telemetry.host.as_deref().unwrap_or_default()),
                "span export enabled"
            );
        }
        TelemetryGuard { provider }
    }

    #[cfg(not(feature = "otel"))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
        TelemetryGuard::default()
    }
}

#[cfg(feature = "otel")]
mod otel {
    use std::collections::HashMap;

    use base64::Engine as _;
    use memoria_config::model::TelemetryConfig;
    use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
    use opentelemetry_sdk::trace::span_processor_with_async_runtime::BatchSpanProcessor;
    use opentelemetry_sdk::trace::SdkTracerProvider;
    use opentelemetry_sdk::{runtime, Resource};

    /// OTLP/HTTP traces endpoint under the telemetry host.
    pub fn endpoint(host: &str) -> String {
        format!("{}/api/public/otel/v1/traces", host.trim_end_matches('/'))
    }

    /// `Authorization` value built from the public/secret key pair.
    pub fn basic_auth(public_key: &str, secret_key: &str) -> String {
        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{public_key}:{secret_key}"));
        format!("Basic {token}")
    }

    /// Builds the span pipeline, or `None` when export is disabled or unconfigured.
    pub fn tracer_provider(
        config: &TelemetryConfig,
    ) -> Result<Option<SdkTracerProvider>, String> {
        if !config.enabled {
            return Ok(None);
        }
        let (Some(host), Some(public_key), Some(secret_key)) = (
            config.host.as_deref(),
            config.public_key.as_deref(),
            config.secret_key.as_deref(),
        ) else {
            return Ok(None);
        };

        let headers = HashMap::from([(
            "Authorization".to_string(),
            basic_auth(public_key, secret_key),
        )]);
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(endpoint(host))
            .with_headers(headers)
            .build()
            .map_err(|e| format!("failed to build OTLP exporter: {e}"))?;

        let processor = BatchSpanProcessor::builder(exporter, runtime::Tokio).build();
        let provider = SdkTracerProvider::builder()
            .with_span_processor(processor)
            .with_resource(Resource::builder().with_service_name("memoria").build())
            .build();
        Ok(Some(provider))
    }

}
