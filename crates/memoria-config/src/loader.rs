// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./memoria.toml` > `~/.config/memoria/memoria.toml` > `/etc/memoria/memoria.toml`
//! with environment variable overrides via the `MEMORIA_` prefix and the
//! bare credential variables (`PINECONE_API_KEY`, ...) used by existing deployments.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::Uncased,
    Figment,
};

use crate::model::MemoriaConfig;

/// Bare environment variables accepted for credentials, with their config key.
pub const CREDENTIAL_ENV_VARS: &[(&str, &str)] = &[
    ("PINECONE_API_KEY", "pinecone.api_key"),
    ("PINECONE_INDEX_NAME", "pinecone.index_name"),
    ("OPENROUTER_API_KEY", "openrouter.api_key"),
    ("LANGFUSE_PUBLIC_KEY", "telemetry.public_key"),
    ("LANGFUSE_SECRET_KEY", "telemetry.secret_key"),
    ("LANGFUSE_HOST", "telemetry.host"),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/memoria/memoria.toml` (system-wide)
/// 3. `~/.config/memoria/memoria.toml` (user XDG config)
/// 4. `./memoria.toml` (local directory)
/// 5. Bare credential variables (`PINECONE_API_KEY`, ...)
/// 6. `MEMORIA_*` environment variables
pub fn load_config() -> Result<MemoriaConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MemoriaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemoriaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MemoriaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemoriaConfig::default()))
        .merge(Toml::file(path))
        .merge(credential_env_provider())
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MemoriaConfig::default()))
        .merge(Toml::file("/etc/memoria/memoria.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("memoria/memoria.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("memoria.toml"))
        .merge(credential_env_provider())
        .merge(env_provider())
}

/// Create the `MEMORIA_` environment variable provider using explicit `map()`.
///
/// Uses `Env::map()` NOT `Env::split("_")`: `MEMORIA_PINECONE_INDEX_NAME`
/// must map to `pinecone.index_name`, not `pinecone.index.name`.
fn env_provider() -> Env {
    Env::prefixed("MEMORIA_").map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("pinecone_", "pinecone.", 1)
            .replacen("openrouter_", "openrouter.", 1)
            .replacen("embedding_", "embedding.", 1)
            .replacen("telemetry_", "telemetry.", 1)
            .replacen("memory_", "memory.", 1);
        mapped.into()
    })
}

/// Provider for the bare credential variables listed in [`CREDENTIAL_ENV_VARS`].
fn credential_env_provider() -> Env {
    let names: Vec<&str> = CREDENTIAL_ENV_VARS.iter().map(|(env, _)| *env).collect();
    Env::raw().only(&names).map(|key| {
        let key_str = key.as_str();
        CREDENTIAL_ENV_VARS
            .iter()
            .find(|(env, _)| env.eq_ignore_ascii_case(key_str))
            .map(|(_, mapped)| Uncased::from(*mapped))
            .unwrap_or_else(|| Uncased::from(key_str.to_ascii_lowercase()))
    })
}
