// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Memoria memory service.

use thiserror::Error;

/// Boxed error source carried by adapter failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all Memoria adapter traits and core operations.
#[derive(Debug, Error)]
pub enum MemoriaError {
    /// Configuration errors (missing credentials, invalid values). Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Oracle/provider errors (API failure, HTTP transport, malformed envelope).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<BoxError>,
    },

    /// A single embed/upsert/query/fetch/update/delete call against the store failed.
    #[error("storage error during {operation}{}: {message}", record_suffix(.record_id))]
    Storage {
        /// Store operation name (e.g. "upsert", "query", "delete").
        operation: &'static str,
        /// Record id the operation targeted, if known.
        record_id: Option<String>,
        message: String,
        source: Option<BoxError>,
    },

    /// The fact extraction response could not be parsed.
    #[error("extraction response could not be parsed: {0}")]
    ExtractionParse(String),

    /// The reconciliation response failed validation or referenced an unknown id.
    #[error("reconciliation failed: {0}")]
    Reconciliation(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

fn record_suffix(record_id: &Option<String>) -> String {
    match record_id {
        Some(id) => format!(" (record {id})"),
        None => String::new(),
    }
}

impl MemoriaError {
    /// Build a storage error for `operation` without an underlying source.
    pub fn storage(
        operation: &'static str,
        record_id: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        MemoriaError::Storage {
            operation,
            record_id: record_id.map(str::to_string),
            message: message.into(),
            source: None,
        }
    }

    /// Build a provider error wrapping an underlying source.
    pub fn provider(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        MemoriaError::Provider {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
