// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::aid::Aid;
use super::capability::MethodId;
use super::context::ExecutionContext;

/// Identity of one firewall proxy. Equality, hashing and display of a proxy
/// are answered from this value alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ProxyId(pub Uuid);

impl ProxyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProxyId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProxyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Firewall decisions, one event per proxy construction and per
/// cross-package call. Intra-package calls do not cross the firewall and
/// produce no event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FirewallEvent {
    ProxyCreated {
        proxy_id: ProxyId,
        type_name: &'static str,
        owner: ExecutionContext,
        whitelist: Vec<MethodId>,
        created_at: DateTime<Utc>,
    },
    CallForwarded {
        proxy_id: ProxyId,
        method: MethodId,
        caller_package: Option<Aid>,
        owner: ExecutionContext,
        forwarded_at: DateTime<Utc>,
    },
    CallDenied {
        proxy_id: ProxyId,
        method: MethodId,
        caller_package: Option<Aid>,
        owner: ExecutionContext,
        denied_at: DateTime<Utc>,
    },
}

impl FirewallEvent {
    pub fn proxy_id(&self) -> ProxyId {
        match self {
            Self::ProxyCreated { proxy_id, .. }
            | Self::CallForwarded { proxy_id, .. }
            | Self::CallDenied { proxy_id, .. } => *proxy_id,
        }
    }

    pub fn is_denial(&self) -> bool {
        matches!(self, Self::CallDenied { .. })
    }
}
