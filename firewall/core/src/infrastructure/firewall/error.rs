// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use thiserror::Error;

use crate::domain::aid::Aid;
use crate::domain::capability::MethodId;

/// Firewall enforcement errors.
///
/// Capability interfaces return their own error type; it must implement
/// `From<FirewallError>` so that a denial surfaces through the same `Result`
/// as the callee's own errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FirewallError {
    /// Cross-package call to a method outside the proxy's capability surface.
    /// Raised before the call is forwarded.
    #[error("Calling {method} is not allowed from package {} (owner {owner_package})", caller_display(.caller_package))]
    AccessDenied {
        method: MethodId,
        caller_package: Option<Aid>,
        owner_package: Aid,
    },

    /// An object was wrapped while no applet context was active, so there is
    /// no owner to bind it to.
    #[error("Cannot wrap a shareable object without an active execution context")]
    NoActiveContext,
}

fn caller_display(caller: &Option<Aid>) -> String {
    caller.map(|aid| aid.to_string()).unwrap_or_else(|| "<none>".to_string())
}
