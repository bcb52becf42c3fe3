// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Enforces required credentials and value ranges that serde attributes
//! cannot express. Collects every error instead of failing fast.

use crate::diagnostic::ConfigError;
use crate::model::MemoriaConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &MemoriaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let required = [
        ("pinecone.api_key", "PINECONE_API_KEY", &config.pinecone.api_key),
        ("pinecone.index_name", "PINECONE_INDEX_NAME", &config.pinecone.index_name),
        ("openrouter.api_key", "OPENROUTER_API_KEY", &config.openrouter.api_key),
        ("telemetry.public_key", "LANGFUSE_PUBLIC_KEY", &config.telemetry.public_key),
        ("telemetry.secret_key", "LANGFUSE_SECRET_KEY", &config.telemetry.secret_key),
        ("telemetry.host", "LANGFUSE_HOST", &config.telemetry.host),
    ];
    for (key, env_var, value) in required {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            errors.push(ConfigError::missing(key, Some(env_var)));
        }
    }

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    }

    if let Some(host) = &config.telemetry.host
        && !host.trim().is_empty()
        && !(host.starts_with("http://") || host.starts_with("https://"))
    {
        errors.push(ConfigError::Validation {
            message: format!("telemetry.host `{host}` must start with http:// or https://"),
        });
    }

    let threshold = config.memory.score_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        errors.push(ConfigError::Validation {
            message: format!("memory.score_threshold must be within [0, 1], got {threshold}"),
        });
    }

    let temperature = config.openrouter.temperature;
    if !(0.0..=2.0).contains(&temperature) {
        errors.push(ConfigError::Validation {
            message: format!("openrouter.temperature must be within [0, 2], got {temperature}"),
        });
    }

    let positive = [
        ("memory.search_limit", config.memory.search_limit as u64),
        ("memory.neighbor_limit", config.memory.neighbor_limit as u64),
        ("memory.max_neighbors", config.memory.max_neighbors as u64),
        ("memory.page_size", config.memory.page_size as u64),
        ("memory.oracle_timeout_secs", config.memory.oracle_timeout_secs),
        ("memory.store_timeout_secs", config.memory.store_timeout_secs),
        ("openrouter.max_tokens", u64::from(config.openrouter.max_tokens)),
    ];
    for (key, value) in positive {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be greater than zero"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
