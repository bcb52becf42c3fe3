// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term fact memory for Memoria.
//!
//! The pipeline behind `POST /api/v1/memory/` lives here:
//!
//! 1. [`FactExtractor`] turns a chat transcript into short facts.
//! 2. [`MemoryReconciler`] gathers each fact's nearest stored neighbors,
//!    hides their ids behind a [`NeighborSnapshot`], and asks a
//!    [`DecisionOracle`] for ADD / UPDATE / DELETE / NONE decisions.
//! 3. [`MemoryApplier`] applies those decisions against the
//!    [`MemoryStore`], one at a time and best-effort.
//!
//! [`MemoryService`] wires the three together and also serves the read and
//! delete paths.

pub mod applier;
pub mod extractor;
pub mod oracle;
mod parse;
pub mod prompts;
pub mod reconciler;
pub mod service;
pub mod store;
pub mod types;

pub use applier::MemoryApplier;
pub use extractor::FactExtractor;
pub use oracle::{DecisionOracle, OracleContext, OracleSettings, ProviderOracle};
pub use reconciler::{MemoryReconciler, ReconcileSettings};
pub use service::{MemoryService, MemorySettings};
pub use store::MemoryStore;
pub use types::{
    AddMemoryOutcome, AddMemoryRequest, ApplyReport, Decision, Fact, MemoryEvent, MemoryRecord,
    NeighborSnapshot, ProposedDecision, ScoredMemory,
};
