// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Firewall Audit Sinks
//!
//! Every [`FirewallEvent`] a proxy produces is handed to a
//! [`FirewallAuditSink`]. Denials are the security-relevant records: the
//! default [`TracingAuditSink`] writes them at `WARN` with the full payload,
//! forwarded calls and proxy creation at `DEBUG`.
//!
//! [`RecordingAuditSink`] keeps events in memory so hosts and tests can
//! inspect what crossed the firewall.

use std::cell::RefCell;

use tracing::{debug, warn};

use crate::domain::events::FirewallEvent;

pub trait FirewallAuditSink {
    fn record(&self, event: &FirewallEvent);
}

/// Writes firewall events to the structured tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    pub fn new() -> Self {
        Self
    }
}

impl FirewallAuditSink for TracingAuditSink {
    fn record(&self, event: &FirewallEvent) {
        match event {
            FirewallEvent::ProxyCreated {
                proxy_id,
                type_name,
                owner,
                whitelist,
                ..
            } => {
                debug!(
                    proxy = %proxy_id,
                    type_name,
                    owner = %owner,
                    whitelisted = whitelist.len(),
                    "Shareable object wrapped"
                );
            }
            FirewallEvent::CallForwarded {
                proxy_id,
                method,
                caller_package,
                owner,
                ..
            } => {
                debug!(
                    proxy = %proxy_id,
                    method = %method,
                    caller = ?caller_package,
                    owner = %owner,
                    "Cross-package call forwarded"
                );
            }
            FirewallEvent::CallDenied { .. } => {
                warn!("Applet firewall violation: {:?}", event);
            }
        }
    }
}

/// In-memory sink. Also logs through [`TracingAuditSink`].
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: RefCell<Vec<FirewallEvent>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FirewallEvent> {
        self.events.borrow().clone()
    }

    pub fn denied_count(&self) -> usize {
        self.events.borrow().iter().filter(|e| e.is_denial()).count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl FirewallAuditSink for RecordingAuditSink {
    fn record(&self, event: &FirewallEvent) {
        TracingAuditSink.record(event);
        self.events.borrow_mut().push(event.clone());
    }
}
