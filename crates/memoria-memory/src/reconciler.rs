// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory reconciliation: decide what each new fact does to stored memory.
//!
//! For every fact the nearest stored records of the same owner are
//! collected. Their ids are replaced by local indices before the oracle
//! sees them, and every UPDATE/DELETE the oracle proposes must point back
//! at one of those indices.

use std::collections::HashSet;
use std::sync::Arc;

use memoria_core::error::MemoriaError;
use tracing::{debug, info};

use crate::oracle::{DecisionOracle, OracleContext};
use crate::store::MemoryStore;
use crate::types::{Decision, Fact, MemoryEvent, MemoryRecord, NeighborSnapshot, ProposedDecision};

/// Neighbor retrieval limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileSettings {
    /// Minimum similarity for a stored record to count as a neighbor.
    pub score_threshold: f32,
    /// Neighbors fetched per fact.
    pub neighbor_limit: usize,
    /// Cap on distinct neighbors shown to the oracle.
    pub max_neighbors: usize,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            score_threshold: 0.75,
            neighbor_limit: 3,
            max_neighbors: 20,
        }
    }
}

/// Turns facts into validated decisions.
pub struct MemoryReconciler {
    store: Arc<MemoryStore>,
    oracle: Arc<dyn DecisionOracle>,
    settings: ReconcileSettings,
}

impl MemoryReconciler {
    pub fn new(
        store: Arc<MemoryStore>,
        oracle: Arc<dyn DecisionOracle>,
        settings: ReconcileSettings,
    ) -> Self {
        Self {
            store,
            oracle,
            settings,
        }
    }

    /// Reconcile `facts` against `owner`'s stored memory.
    ///
    /// Decisions come back in the oracle's order. Any store failure while
    /// gathering neighbors, or any malformed or unresolvable oracle
    /// answer, fails the whole call and nothing should be applied.
    pub async fn reconcile(
        &self,
        facts: &[Fact],
        owner: &str,
    ) -> Result<Vec<Decision>, MemoriaError> {
        let neighbors = self.gather_neighbors(facts, owner).await?;
        let snapshot = NeighborSnapshot::new(&neighbors);
        debug!(owner, facts = facts.len(), neighbors = snapshot.len(), "reconciling");

        let context = OracleContext {
            owner: owner.to_string(),
            existing: snapshot.entries(),
            facts: facts.to_vec(),
        };
        let proposals = self.oracle.propose(&context).await?;
        let decisions = resolve(proposals, &snapshot)?;

        info!(owner, decisions = decisions.len(), "reconciliation complete");
        Ok(decisions)
    }

    /// Nearest records per fact, in encounter order, first occurrence kept.
    async fn gather_neighbors(
        &self,
        facts: &[Fact],
        owner: &str,
    ) -> Result<Vec<MemoryRecord>, MemoriaError> {
        let mut seen = HashSet::new();
        let mut neighbors = Vec::new();

        for fact in facts {
            let hits = self
                .store
                .search(
                    fact,
                    owner,
                    self.settings.score_threshold,
                    self.settings.neighbor_limit,
                )
                .await?;
            for hit in hits {
                if neighbors.len() >= self.settings.max_neighbors {
                    return Ok(neighbors);
                }
                if seen.insert(hit.record.id.clone()) {
                    neighbors.push(hit.record);
                }
            }
        }
        Ok(neighbors)
    }
}

/// Map oracle proposals onto storage ids through `snapshot`.
pub fn resolve(
    proposals: Vec<ProposedDecision>,
    snapshot: &NeighborSnapshot,
) -> Result<Vec<Decision>, MemoriaError> {
    proposals
        .into_iter()
        .map(|proposal| {
            let target_id = match proposal.event {
                MemoryEvent::Add => None,
                MemoryEvent::Update | MemoryEvent::Delete => {
                    let id = snapshot.resolve(&proposal.id).ok_or_else(|| {
                        MemoriaError::Reconciliation(format!(
                            "{} references unknown memory id `{}`",
                            proposal.event, proposal.id
                        ))
                    })?;
                    Some(id.to_string())
                }
                MemoryEvent::None => snapshot.resolve(&proposal.id).map(str::to_string),
            };
            Ok(Decision {
                local_id: proposal.id,
                text: proposal.text,
                event: proposal.event,
                target_id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemoryRecord;
    use memoria_core::types::Metadata;

    fn snapshot() -> NeighborSnapshot {
        let records: Vec<MemoryRecord> = ["uuid-a", "uuid-b"]
            .iter()
            .map(|id| MemoryRecord {
                id: id.to_string(),
                text: format!("text of {id}"),
                owner: "alice".into(),
                hash: String::new(),
                created_at: None,
                updated_at: None,
                metadata: Metadata::new(),
            })
            .collect();
        NeighborSnapshot::new(&records)
    }

    #[test]
    fn resolves_update_and_delete() {
        let decisions = resolve(
            vec![
                ProposedDecision::new("1", "new text", MemoryEvent::Update),
                ProposedDecision::new("0", "text of uuid-a", MemoryEvent::Delete),
            ],
            &snapshot(),
        )
        .unwrap();
        assert_eq!(decisions[0].target_id.as_deref(), Some("uuid-b"));
        assert_eq!(decisions[1].target_id.as_deref(), Some("uuid-a"));
    }

    #[test]
    fn add_ignores_local_id() {
        let decisions = resolve(
            vec![ProposedDecision::new("0", "brand new", MemoryEvent::Add)],
            &snapshot(),
        )
        .unwrap();
        assert_eq!(decisions[0].target_id, None);
        assert_eq!(decisions[0].local_id, "0");
    }

    #[test]
    fn unknown_local_id_is_rejected() {
        let err = resolve(
            vec![
                ProposedDecision::new("0", "fine", MemoryEvent::Update),
                ProposedDecision::new("7", "invented", MemoryEvent::Delete),
            ],
            &snapshot(),
        )
        .unwrap_err();
        assert!(matches!(err, MemoriaError::Reconciliation(_)));
        assert!(err.to_string().contains("`7`"));
    }

    #[test]
    fn storage_id_is_not_a_local_id() {
        let err = resolve(
            vec![ProposedDecision::new("uuid-a", "x", MemoryEvent::Update)],
            &snapshot(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn none_with_unknown_id_is_harmless() {
        let decisions = resolve(
            vec![ProposedDecision::new("42", "whatever", MemoryEvent::None)],
            &snapshot(),
        )
        .unwrap();
        assert_eq!(decisions[0].event, MemoryEvent::None);
        assert_eq!(decisions[0].target_id, None);
    }
}
