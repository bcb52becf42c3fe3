// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Applies reconciliation decisions to the store.
//!
//! Decisions are independent: a failure is logged and counted, and the
//! remaining decisions still run. There is no rollback across decisions.

use std::sync::Arc;

use memoria_core::error::MemoriaError;
use memoria_core::types::Metadata;
use tracing::{debug, warn};

use crate::store::MemoryStore;
use crate::types::{ApplyReport, Decision, MemoryEvent};

/// Executes decisions against a [`MemoryStore`].
pub struct MemoryApplier {
    store: Arc<MemoryStore>,
}

enum Applied {
    Added(String),
    Updated,
    Deleted,
    Unchanged,
}

impl MemoryApplier {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Apply every decision for `owner`, best-effort.
    pub async fn apply(&self, decisions: &[Decision], owner: &str) -> ApplyReport {
        let mut report = ApplyReport::default();

        for decision in decisions {
            match self.apply_one(decision, owner).await {
                Ok(Applied::Added(id)) => {
                    report.added += 1;
                    report.added_ids.push(id);
                }
                Ok(Applied::Updated) => report.updated += 1,
                Ok(Applied::Deleted) => report.deleted += 1,
                Ok(Applied::Unchanged) => report.unchanged += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        owner,
                        event = %decision.event,
                        record_id = decision.target_id.as_deref().unwrap_or("-"),
                        error = %e,
                        "failed to apply memory decision"
                    );
                }
            }
        }

        debug!(
            owner,
            added = report.added,
            updated = report.updated,
            deleted = report.deleted,
            unchanged = report.unchanged,
            failed = report.failed,
            "decisions applied"
        );
        report
    }

    async fn apply_one(&self, decision: &Decision, owner: &str) -> Result<Applied, MemoriaError> {
        match decision.event {
            MemoryEvent::Add => {
                let record = self.store.add(&decision.text, owner, Metadata::new()).await?;
                Ok(Applied::Added(record.id))
            }
            MemoryEvent::Update => {
                self.store
                    .update(target(decision)?, &decision.text, owner)
                    .await?;
                Ok(Applied::Updated)
            }
            MemoryEvent::Delete => {
                self.store.delete(target(decision)?, owner).await?;
                Ok(Applied::Deleted)
            }
            MemoryEvent::None => Ok(Applied::Unchanged),
        }
    }
}

fn target(decision: &Decision) -> Result<&str, MemoriaError> {
    decision.target_id.as_deref().ok_or_else(|| {
        MemoriaError::Internal(format!("{} decision without a target id", decision.event))
    })
}
