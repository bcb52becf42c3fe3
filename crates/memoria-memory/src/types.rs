// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types.

use chrono::{DateTime, Utc};
use memoria_core::types::{ChatMessage, Metadata};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{Display, EnumString};

/// A short natural-language statement extracted from a transcript.
///
/// Facts are request-scoped and never stored as-is.
pub type Fact = String;

/// Metadata keys the store manages itself.
pub mod keys {
    pub const USER_ID: &str = "user_id";
    pub const CONTENT: &str = "content";
    pub const HASH: &str = "hash";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";

    /// All reserved keys, in the order they are written.
    pub const RESERVED: [&str; 5] = [USER_ID, CONTENT, HASH, CREATED_AT, UPDATED_AT];
}

/// A stored fact owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Store-assigned unique id (UUID v4).
    pub id: String,
    /// The fact text.
    #[serde(rename = "memory")]
    pub text: String,
    /// Owner of the record.
    #[serde(rename = "user_id")]
    pub owner: String,
    /// Hex SHA-256 of `text`.
    pub hash: String,
    /// Creation time. Absent on records written without timestamps.
    pub created_at: Option<DateTime<Utc>>,
    /// Time of the last UPDATE, if any.
    pub updated_at: Option<DateTime<Utc>>,
    /// Auxiliary metadata beyond the reserved keys.
    #[serde(default)]
    pub metadata: Metadata,
}

impl MemoryRecord {
    /// Rebuild a record from index metadata.
    ///
    /// Returns `None` when the owner or content key is missing; such
    /// vectors were not written by this store.
    pub fn from_metadata(id: impl Into<String>, mut metadata: Metadata) -> Option<Self> {
        let owner = take_string(&mut metadata, keys::USER_ID)?;
        let text = take_string(&mut metadata, keys::CONTENT)?;
        let hash = take_string(&mut metadata, keys::HASH).unwrap_or_else(|| content_hash(&text));
        let created_at = take_timestamp(&mut metadata, keys::CREATED_AT);
        let updated_at = take_timestamp(&mut metadata, keys::UPDATED_AT);

        Some(Self {
            id: id.into(),
            text,
            owner,
            hash,
            created_at,
            updated_at,
            metadata,
        })
    }

    /// Flatten into index metadata: auxiliary keys plus the reserved ones.
    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = self.metadata.clone();
        metadata.insert(keys::USER_ID.into(), self.owner.clone().into());
        metadata.insert(keys::CONTENT.into(), self.text.clone().into());
        metadata.insert(keys::HASH.into(), self.hash.clone().into());
        if let Some(created_at) = self.created_at {
            metadata.insert(keys::CREATED_AT.into(), created_at.to_rfc3339().into());
        }
        if let Some(updated_at) = self.updated_at {
            metadata.insert(keys::UPDATED_AT.into(), updated_at.to_rfc3339().into());
        }
        metadata
    }
}

fn take_string(metadata: &mut Metadata, key: &str) -> Option<String> {
    match metadata.remove(key)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    }
}

fn take_timestamp(metadata: &mut Metadata, key: &str) -> Option<DateTime<Utc>> {
    let raw = take_string(metadata, key)?;
    DateTime::parse_from_rfc3339(&raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Hex-encoded SHA-256 of a fact's text.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// A record returned by similarity search, with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMemory {
    #[serde(flatten)]
    pub record: MemoryRecord,
    pub score: f32,
}

/// What the oracle decided to do with a fact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum MemoryEvent {
    /// Store the text as a new record.
    Add,
    /// Replace an existing record's text.
    Update,
    /// Remove an existing record.
    Delete,
    /// Leave memory unchanged.
    None,
}

/// A decision exactly as the oracle returned it, ids still local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedDecision {
    pub id: String,
    pub text: String,
    pub event: MemoryEvent,
}

impl ProposedDecision {
    pub fn new(id: impl Into<String>, text: impl Into<String>, event: MemoryEvent) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            event,
        }
    }
}

/// A validated decision ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// The local id the oracle used. Meaningless for ADD.
    pub local_id: String,
    /// New content for ADD/UPDATE; informational for DELETE/NONE.
    pub text: String,
    pub event: MemoryEvent,
    /// Resolved storage id. Always set for UPDATE and DELETE, never for ADD.
    pub target_id: Option<String>,
}

/// A neighbor as shown to the oracle: local id and text only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborEntry {
    pub id: String,
    pub text: String,
}

/// Request-scoped mapping from local ids (`"0"`, `"1"`, ...) to record ids.
///
/// Built fresh for every reconciliation from the neighbor list, in order,
/// so the oracle never sees storage ids.
#[derive(Debug, Clone, Default)]
pub struct NeighborSnapshot {
    entries: Vec<(NeighborEntry, String)>,
}

impl NeighborSnapshot {
    /// Assign local ids in enumeration order of `neighbors`.
    pub fn new<'a>(neighbors: impl IntoIterator<Item = &'a MemoryRecord>) -> Self {
        let entries = neighbors
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                (
                    NeighborEntry {
                        id: index.to_string(),
                        text: record.text.clone(),
                    },
                    record.id.clone(),
                )
            })
            .collect();
        Self { entries }
    }

    /// The storage id behind a local id.
    pub fn resolve(&self, local_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(entry, _)| entry.id == local_id)
            .map(|(_, record_id)| record_id.as_str())
    }

    /// What the oracle is allowed to see.
    pub fn entries(&self) -> Vec<NeighborEntry> {
        self.entries.iter().map(|(entry, _)| entry.clone()).collect()
    }

    /// Every storage id in the snapshot.
    pub fn record_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, id)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome counters for one `apply` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub failed: usize,
    /// Ids minted for successful ADDs, in decision order.
    pub added_ids: Vec<String>,
}

impl ApplyReport {
    /// Decisions that went through, NONE included.
    pub fn succeeded(&self) -> usize {
        self.added + self.updated + self.deleted + self.unchanged
    }

    /// Total decisions seen.
    pub fn total(&self) -> usize {
        self.succeeded() + self.failed
    }
}

/// Body of `POST /api/v1/memory/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddMemoryRequest {
    pub messages: Vec<ChatMessage>,
    pub user_id: String,
    #[serde(default)]
    pub lang: Option<String>,
}

/// Result of one add-memory pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMemoryOutcome {
    pub message: String,
    pub facts: Vec<Fact>,
    /// Absent when there was nothing to reconcile.
    pub report: Option<ApplyReport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record(id: &str, text: &str) -> MemoryRecord {
        MemoryRecord {
            id: id.into(),
            text: text.into(),
            owner: "alice".into(),
            hash: content_hash(text),
            created_at: None,
            updated_at: None,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn event_labels_are_uppercase() {
        assert_eq!(MemoryEvent::Add.to_string(), "ADD");
        assert_eq!(MemoryEvent::from_str("DELETE").unwrap(), MemoryEvent::Delete);
        assert_eq!(MemoryEvent::from_str("NONE").unwrap(), MemoryEvent::None);
        assert!(MemoryEvent::from_str("MERGE").is_err());
        assert_eq!(
            serde_json::to_string(&MemoryEvent::Update).unwrap(),
            "\"UPDATE\""
        );
    }

    #[test]
    fn snapshot_assigns_indices_in_order() {
        let neighbors = vec![record("uuid-a", "likes tea"), record("uuid-b", "lives in Oslo")];
        let snapshot = NeighborSnapshot::new(&neighbors);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.resolve("0"), Some("uuid-a"));
        assert_eq!(snapshot.resolve("1"), Some("uuid-b"));
        assert_eq!(snapshot.resolve("2"), None);
        assert_eq!(snapshot.resolve("uuid-a"), None);

        let entries = snapshot.entries();
        assert_eq!(entries[1].id, "1");
        assert_eq!(entries[1].text, "lives in Oslo");
    }

    #[test]
    fn metadata_round_trip_keeps_auxiliary_keys() {
        let mut rec = record("r1", "User is vegetarian");
        rec.created_at = Some(Utc::now());
        rec.metadata.insert("source".into(), "chat".into());

        let rebuilt = MemoryRecord::from_metadata("r1", rec.to_metadata()).unwrap();
        assert_eq!(rebuilt.owner, "alice");
        assert_eq!(rebuilt.text, "User is vegetarian");
        assert_eq!(rebuilt.hash, rec.hash);
        assert_eq!(
            rebuilt.created_at.map(|t| t.timestamp()),
            rec.created_at.map(|t| t.timestamp())
        );
        assert_eq!(rebuilt.metadata.get("source"), Some(&"chat".into()));
        assert!(!rebuilt.metadata.contains_key(keys::CONTENT));
    }

    #[test]
    fn metadata_without_owner_is_rejected() {
        let mut metadata = Metadata::new();
        metadata.insert(keys::CONTENT.into(), "orphan".into());
        assert!(MemoryRecord::from_metadata("x", metadata).is_none());
    }

    #[test]
    fn legacy_record_gets_hash_from_content() {
        let mut metadata = Metadata::new();
        metadata.insert(keys::USER_ID.into(), "bob".into());
        metadata.insert(keys::CONTENT.into(), "likes jazz".into());
        let rec = MemoryRecord::from_metadata("x", metadata).unwrap();
        assert_eq!(rec.hash, content_hash("likes jazz"));
        assert!(rec.created_at.is_none());
    }

    #[test]
    fn record_serializes_with_wire_names() {
        let json = serde_json::to_value(ScoredMemory {
            record: record("r1", "likes tea"),
            score: 0.9,
        })
        .unwrap();
        assert_eq!(json["memory"], "likes tea");
        assert_eq!(json["user_id"], "alice");
        assert_eq!(json["id"], "r1");
        assert!((json["score"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn none_counts_as_success() {
        let report = ApplyReport {
            added: 1,
            unchanged: 2,
            failed: 1,
            ..Default::default()
        };
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.total(), 4);
    }

    #[test]
    fn add_request_lang_is_optional() {
        let req: AddMemoryRequest = serde_json::from_str(
            r#"{"messages": [{"role": "user", "content": "hi"}], "user_id": "u1"}"#,
        )
        .unwrap();
        assert!(req.lang.is_none());
        assert_eq!(req.messages.len(), 1);
    }
}
