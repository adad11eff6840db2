// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Applet Firewall
//!
//! The enforcement point every cross-package call passes through.
//!
//! ## Processing Pipeline
//!
//! ```text
//! FirewallProxy::wrap(source, object)
//!   └─ CapabilitySurface::of(object.type_descriptor())   ← frozen whitelist
//!   └─ owner = source.context_manager().active_context()
//!
//! <capability trait method on the proxy>
//!   └─ FirewallProxy::invoke(method, call)
//!         ├─ caller package == owner package → call(&object)
//!         ├─ method ∉ surface               → FirewallError::AccessDenied
//!         └─ ContextGuard::enter(owner)      → call(&object) → guard drop leaves
//! ```

pub mod audit;
pub mod error;
pub mod guard;
pub mod proxy;

pub use audit::{FirewallAuditSink, RecordingAuditSink, TracingAuditSink};
pub use error::FirewallError;
pub use guard::ContextGuard;
pub use proxy::FirewallProxy;
