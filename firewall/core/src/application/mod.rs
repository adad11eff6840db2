// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application
//!
//! Channel bookkeeping and the package/applet identity table used by the
//! command-dispatch loop to drive context managers.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Orchestrates per-channel context managers

pub mod channels;
pub mod identity_registry;

pub use channels::{ChannelError, ChannelSet};
pub use identity_registry::{IdentityRegistry, RegistryError};
