// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `cardsim-core` — Applet Firewall and Execution Context Manager
//!
//! The isolation layer of the cardsim smart-card simulator. Independently
//! installed applets share one address space; this crate keeps them apart the
//! way a card's on-chip firewall does.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `Aid`, `ExecutionContext`, `ContextManager`, capability descriptors, `CardConfigManifest` |
//! | [`application`] | Application | `ChannelSet`, `IdentityRegistry` |
//! | [`infrastructure`] | Infrastructure | `FirewallProxy`, `ContextGuard`, audit sinks |
//!
//! ## Call Flow
//!
//! ```text
//! applet A (package P2) holds FirewallProxy<O> exported by applet B (package P1)
//!   └─ ShareableA::s1(&proxy)
//!         └─ FirewallProxy::invoke(S1, ..)
//!               ├─ caller package == P1 → forward
//!               ├─ S1 not in CapabilitySurface → FirewallError::AccessDenied
//!               └─ enter (P1, B) → forward → leave (ContextGuard)
//! ```

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
pub use application::{ChannelError, ChannelSet, IdentityRegistry, RegistryError};
pub use infrastructure::firewall::{
    ContextGuard, FirewallAuditSink, FirewallError, FirewallProxy, RecordingAuditSink, TracingAuditSink,
};
