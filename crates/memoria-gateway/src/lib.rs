// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Memoria memory service.
//!
//! Exposes [`MemoryService`](memoria_memory::MemoryService) over a small
//! JSON API under `/api/v1/memory`, plus an unauthenticated `/health`.

pub mod handlers;
pub mod server;

pub use server::{router, start_server, GatewayState, ServerConfig};
