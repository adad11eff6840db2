// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Identity values, execution contexts and the capability model.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure access-control types with no I/O

pub mod aid;
pub mod hex_string;
pub mod context;
pub mod capability;
pub mod events;
pub mod card_config;

pub use aid::{Aid, AidError};
pub use capability::{
    CapabilityMethod, CapabilitySurface, Handles, InterfaceDescriptor, MethodId, Shareable, TypeDescriptor,
    SHAREABLE,
};
pub use context::{ContextError, ContextManager, ContextSource, ExecutionContext, SharedContextManager};
pub use events::{FirewallEvent, ProxyId};
