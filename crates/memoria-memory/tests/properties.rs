// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests for id resolution and owner isolation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use memoria_core::types::Metadata;
use memoria_memory::reconciler::resolve;
use memoria_memory::{MemoryEvent, MemoryRecord, MemoryStore, NeighborSnapshot, ProposedDecision};
use memoria_test_utils::{InMemoryIndex, MockEmbedder};
use proptest::prelude::*;

fn arb_event() -> impl Strategy<Value = MemoryEvent> {
    prop_oneof![
        Just(MemoryEvent::Add),
        Just(MemoryEvent::Update),
        Just(MemoryEvent::Delete),
        Just(MemoryEvent::None),
    ]
}

fn arb_proposal() -> impl Strategy<Value = ProposedDecision> {
    // local ids in 0..12 so some hit the snapshot and some do not
    (0u8..12, "[a-z ]{1,12}", arb_event())
        .prop_map(|(id, text, event)| ProposedDecision::new(id.to_string(), text, event))
}

fn neighbors(n: usize) -> Vec<MemoryRecord> {
    (0..n)
        .map(|i| MemoryRecord {
            id: format!("record-{i}"),
            text: format!("fact {i}"),
            owner: "alice".into(),
            hash: String::new(),
            created_at: None,
            updated_at: None,
            metadata: Metadata::new(),
        })
        .collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn snapshot_ids_follow_enumeration_order(n in 0usize..30) {
        let records = neighbors(n);
        let snapshot = NeighborSnapshot::new(&records);

        prop_assert_eq!(snapshot.len(), n);
        for (i, entry) in snapshot.entries().iter().enumerate() {
            prop_assert_eq!(&entry.id, &i.to_string());
            prop_assert_eq!(snapshot.resolve(&entry.id), Some(records[i].id.as_str()));
        }
        prop_assert_eq!(snapshot.resolve(&n.to_string()), None);
    }

    #[test]
    fn resolved_targets_always_come_from_the_snapshot(
        n in 0usize..8,
        proposals in prop::collection::vec(arb_proposal(), 0..10),
    ) {
        let records = neighbors(n);
        let snapshot = NeighborSnapshot::new(&records);
        let known: HashSet<&str> = snapshot.record_ids().collect();

        let any_dangling = proposals.iter().any(|p| {
            matches!(p.event, MemoryEvent::Update | MemoryEvent::Delete)
                && snapshot.resolve(&p.id).is_none()
        });

        match resolve(proposals.clone(), &snapshot) {
            Ok(decisions) => {
                prop_assert!(!any_dangling);
                prop_assert_eq!(decisions.len(), proposals.len());
                for (decision, proposal) in decisions.iter().zip(&proposals) {
                    prop_assert_eq!(decision.event, proposal.event);
                    if let Some(target) = &decision.target_id {
                        prop_assert!(known.contains(target.as_str()));
                    }
                    if matches!(decision.event, MemoryEvent::Update | MemoryEvent::Delete) {
                        prop_assert!(decision.target_id.is_some());
                    }
                    if decision.event == MemoryEvent::Add {
                        prop_assert!(decision.target_id.is_none());
                    }
                }
            }
            Err(_) => prop_assert!(any_dangling),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn reads_never_cross_owners(
        entries in prop::collection::vec((0usize..3, "[a-z]{2,6}( [a-z]{2,6}){0,3}"), 1..12),
        query in "[a-z]{2,6}( [a-z]{2,6}){0,2}",
    ) {
        let owners = ["alice", "bob", "carol"];
        let rt = runtime();
        rt.block_on(async {
            let store = MemoryStore::new(
                Arc::new(MockEmbedder::new()),
                Arc::new(InMemoryIndex::new()),
                Duration::from_secs(5),
                100,
            );
            for (owner, text) in &entries {
                store.add(text, owners[*owner], Metadata::new()).await.unwrap();
            }

            for owner in owners {
                let hits = store.search(&query, owner, 0.0, 50).await.unwrap();
                prop_assert!(hits.iter().all(|h| h.record.owner == owner));

                let all = store.get_all_by_owner(owner).await.unwrap();
                let expected = entries.iter().filter(|(o, _)| owners[*o] == owner).count();
                prop_assert_eq!(all.len(), expected);
                prop_assert!(all.iter().all(|r| r.owner == owner));
            }
            Ok(())
        })?;
    }

    #[test]
    fn search_never_returns_below_threshold(
        texts in prop::collection::vec("[a-z]{2,6}( [a-z]{2,6}){0,3}", 1..10),
        query in "[a-z]{2,6}( [a-z]{2,6}){0,2}",
        threshold in 0.0f32..1.0,
    ) {
        let rt = runtime();
        rt.block_on(async {
            let store = MemoryStore::new(
                Arc::new(MockEmbedder::new()),
                Arc::new(InMemoryIndex::new()),
                Duration::from_secs(5),
                100,
            );
            for text in &texts {
                store.add(text, "alice", Metadata::new()).await.unwrap();
            }
            let hits = store.search(&query, "alice", threshold, 50).await.unwrap();
            prop_assert!(hits.iter().all(|h| h.score >= threshold));
            prop_assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
            Ok(())
        })?;
    }
}
