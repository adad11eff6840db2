// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Firewall Proxy
//!
//! A [`FirewallProxy`] is the only handle a foreign package ever receives for
//! a shareable object. It is bound at construction to:
//!
//! - the **owner context**: the execution context active when the object was
//!   wrapped;
//! - the **capability surface**: the frozen set of methods declared on the
//!   object's capability-tagged interfaces;
//! - a **context source** resolved on every call.
//!
//! The proxy never hands out the wrapped object. The only way to run code on
//! it is [`FirewallProxy::call`], naming a [`CapabilityMethod`] marker; what
//! runs is the object's own [`Handles`] implementation for that marker.
//! Capability interfaces are Rust traits implemented for `FirewallProxy<T, S>`
//! on top of `call`:
//!
//! ```text
//! struct Greet;
//! impl CapabilityMethod for Greet { const ID: MethodId = GREET; type Args = (); type Output = i16; type Error = GreeterError; }
//!
//! impl<T: Shareable + Handles<Greet>, S: ContextSource> Greeter for FirewallProxy<T, S> {
//!     fn greet(&self) -> Result<i16, GreeterError> {
//!         self.call::<Greet>(())
//!     }
//! }
//! ```
//!
//! ## Decision Per Call
//!
//! | Caller package      | Method whitelisted | Outcome                                       |
//! |---------------------|--------------------|-----------------------------------------------|
//! | == owner package    | (not consulted)    | forwarded, stack untouched                    |
//! | != owner package    | no                 | `AccessDenied`, callee never runs             |
//! | != owner package    | yes                | owner entered, forwarded, owner left on exit  |
//!
//! Arbitrary code cannot be paired with a whitelisted method id:
//!
//! ```compile_fail
//! use cardsim_core::{FirewallError, FirewallProxy, MethodId, Shareable, TypeDescriptor};
//!
//! static VAULT: TypeDescriptor = TypeDescriptor { name: "Vault", parent: None, interfaces: &[], methods: &[] };
//!
//! struct Vault;
//! impl Shareable for Vault {
//!     fn type_descriptor(&self) -> &'static TypeDescriptor { &VAULT }
//! }
//! impl Vault {
//!     fn secret(&self) -> i16 { 42 }
//! }
//!
//! fn steal(proxy: &FirewallProxy<Vault>) -> Result<i16, FirewallError> {
//!     proxy.invoke(MethodId::new("s1()S"), |vault| Ok(vault.secret()))
//! }
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use chrono::Utc;

use crate::domain::capability::{CapabilityMethod, CapabilitySurface, Handles, MethodId, Shareable};
use crate::domain::context::{ContextSource, ExecutionContext, SharedContextManager};
use crate::domain::events::{FirewallEvent, ProxyId};

use super::audit::{FirewallAuditSink, TracingAuditSink};
use super::error::FirewallError;
use super::guard::ContextGuard;

pub struct FirewallProxy<T, S = SharedContextManager> {
    id: ProxyId,
    object: T,
    owner: ExecutionContext,
    surface: CapabilitySurface,
    source: S,
    audit: Rc<dyn FirewallAuditSink>,
}

impl<T: Shareable, S: ContextSource> FirewallProxy<T, S> {
    /// Wrap `object` on behalf of the currently active context.
    ///
    /// # Errors
    ///
    /// [`FirewallError::NoActiveContext`] when the source's stack is empty.
    pub fn wrap(source: S, object: T) -> Result<Self, FirewallError> {
        Self::wrap_with_audit(source, object, Rc::new(TracingAuditSink::new()))
    }

    /// Same as [`Self::wrap`], reporting events to `audit`.
    pub fn wrap_with_audit(
        source: S,
        object: T,
        audit: Rc<dyn FirewallAuditSink>,
    ) -> Result<Self, FirewallError> {
        let owner = source
            .context_manager()
            .active_context()
            .ok_or(FirewallError::NoActiveContext)?;
        let descriptor = object.type_descriptor();
        let surface = CapabilitySurface::of(descriptor);
        let id = ProxyId::new();

        audit.record(&FirewallEvent::ProxyCreated {
            proxy_id: id,
            type_name: descriptor.name,
            owner,
            whitelist: surface.methods(),
            created_at: Utc::now(),
        });
        metrics::counter!("cardsim_firewall_proxies_created_total").increment(1);

        Ok(Self {
            id,
            object,
            owner,
            surface,
            source,
            audit,
        })
    }

    /// Call method `M` on the wrapped object through the firewall.
    ///
    /// The object's [`Handles<M>`] implementation runs at most once. On a
    /// forwarded cross-package call the owner context is active for its whole
    /// duration and is left afterwards even if the method fails or panics.
    pub fn call<M>(&self, args: M::Args) -> Result<M::Output, M::Error>
    where
        M: CapabilityMethod,
        M::Error: From<FirewallError>,
        T: Handles<M>,
    {
        self.invoke(M::ID, |object| object.handle(args))
    }

    fn invoke<R, E>(&self, method: MethodId, call: impl FnOnce(&T) -> Result<R, E>) -> Result<R, E>
    where
        E: From<FirewallError>,
    {
        let manager = self.source.context_manager();
        let caller_package = manager.active_package_id();

        if caller_package == Some(self.owner.package_id()) {
            metrics::counter!("cardsim_firewall_calls_total", "outcome" => "intra_package").increment(1);
            return call(&self.object);
        }

        if !self.surface.contains(method) {
            self.audit.record(&FirewallEvent::CallDenied {
                proxy_id: self.id,
                method,
                caller_package,
                owner: self.owner,
                denied_at: Utc::now(),
            });
            metrics::counter!("cardsim_firewall_calls_total", "outcome" => "denied").increment(1);
            return Err(FirewallError::AccessDenied {
                method,
                caller_package,
                owner_package: self.owner.package_id(),
            }
            .into());
        }

        self.audit.record(&FirewallEvent::CallForwarded {
            proxy_id: self.id,
            method,
            caller_package,
            owner: self.owner,
            forwarded_at: Utc::now(),
        });
        metrics::counter!("cardsim_firewall_calls_total", "outcome" => "forwarded").increment(1);

        let _guard = ContextGuard::enter(&manager, self.owner);
        call(&self.object)
    }
}

impl<T, S> FirewallProxy<T, S> {
    pub fn id(&self) -> ProxyId {
        self.id
    }

    /// Context the wrapped object runs in when called across packages.
    pub fn owner_context(&self) -> ExecutionContext {
        self.owner
    }

    pub fn capability_surface(&self) -> &CapabilitySurface {
        &self.surface
    }
}

impl<T, S> PartialEq for FirewallProxy<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T, S> Eq for FirewallProxy<T, S> {}

impl<T, S> Hash for FirewallProxy<T, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: Shareable, S> fmt::Display for FirewallProxy<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FirewallProxy bound to {} for {}",
            self.owner.package_id(),
            self.object.type_descriptor().name
        )
    }
}

impl<T: Shareable, S> fmt::Debug for FirewallProxy<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirewallProxy")
            .field("id", &self.id)
            .field("type", &self.object.type_descriptor().name)
            .field("owner", &self.owner)
            .field("whitelist", &self.surface.methods())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aid::Aid;
    use crate::domain::capability::{InterfaceDescriptor, TypeDescriptor, SHAREABLE};
    use crate::infrastructure::firewall::RecordingAuditSink;
    use std::cell::Cell;
    use std::collections::HashSet;

    const PING: MethodId = MethodId::new("ping()S");
    const SECRET: MethodId = MethodId::new("secret()S");

    static PINGABLE: InterfaceDescriptor = InterfaceDescriptor {
        name: "Pingable",
        extends: &[&SHAREABLE],
        methods: &[PING],
    };
    static COUNTER: TypeDescriptor = TypeDescriptor {
        name: "Counter",
        parent: None,
        interfaces: &[&PINGABLE],
        methods: &[SECRET],
    };

    /// Reports the active applet and stack depth seen by the callee.
    struct Ping;
    impl CapabilityMethod for Ping {
        const ID: MethodId = PING;
        type Args = ();
        type Output = (Option<Aid>, usize);
        type Error = FirewallError;
    }

    /// Declared on the type only; bumps the side-effect counter.
    struct Secret;
    impl CapabilityMethod for Secret {
        const ID: MethodId = SECRET;
        type Args = u32;
        type Output = u32;
        type Error = FirewallError;
    }

    struct Counter {
        manager: SharedContextManager,
        calls: Rc<Cell<u32>>,
    }

    impl Shareable for Counter {
        fn type_descriptor(&self) -> &'static TypeDescriptor {
            &COUNTER
        }
    }

    impl Handles<Ping> for Counter {
        fn handle(&self, _: ()) -> Result<(Option<Aid>, usize), FirewallError> {
            Ok((self.manager.active_applet_id(), self.manager.depth()))
        }
    }

    impl Handles<Secret> for Counter {
        fn handle(&self, amount: u32) -> Result<u32, FirewallError> {
            self.calls.set(self.calls.get() + amount);
            Ok(self.calls.get())
        }
    }

    fn aid(s: &str) -> Aid {
        s.parse().unwrap()
    }

    fn counter(manager: &SharedContextManager) -> Counter {
        Counter {
            manager: manager.clone(),
            calls: Rc::new(Cell::new(0)),
        }
    }

    fn owner_manager() -> SharedContextManager {
        let manager = SharedContextManager::new();
        manager.enter_context(aid("F0AA000000"), aid("F0AA000001")).unwrap();
        manager
    }

    #[test]
    fn test_wrap_requires_active_context() {
        let manager = SharedContextManager::new();
        let result = FirewallProxy::wrap(manager.clone(), counter(&manager));
        assert!(matches!(result, Err(FirewallError::NoActiveContext)));
    }

    #[test]
    fn test_wrap_freezes_owner_and_surface() {
        let manager = owner_manager();
        let proxy = FirewallProxy::wrap(manager.clone(), counter(&manager)).unwrap();
        manager.leave_context();

        assert_eq!(proxy.owner_context().applet_id(), aid("F0AA000001"));
        assert_eq!(proxy.capability_surface().methods(), vec![PING]);
    }

    #[test]
    fn test_denied_call_never_reaches_object() {
        let manager = owner_manager();
        let audit = Rc::new(RecordingAuditSink::new());
        let object = counter(&manager);
        let calls = Rc::clone(&object.calls);
        let proxy = FirewallProxy::wrap_with_audit(manager.clone(), object, audit.clone()).unwrap();
        manager.enter_context(aid("F0BB000000"), aid("F0BB000001")).unwrap();

        let result = proxy.call::<Secret>(1);

        assert_eq!(
            result,
            Err(FirewallError::AccessDenied {
                method: SECRET,
                caller_package: Some(aid("F0BB000000")),
                owner_package: aid("F0AA000000"),
            })
        );
        assert_eq!(calls.get(), 0);
        assert_eq!(manager.depth(), 2);
        assert_eq!(audit.denied_count(), 1);
    }

    #[test]
    fn test_forwarded_call_runs_in_owner_context() {
        let manager = owner_manager();
        let proxy = FirewallProxy::wrap(manager.clone(), counter(&manager)).unwrap();
        manager.enter_context(aid("F0BB000000"), aid("F0BB000001")).unwrap();

        assert_eq!(proxy.call::<Ping>(()), Ok((Some(aid("F0AA000001")), 3)));
        assert_eq!(manager.depth(), 2);
    }

    #[test]
    fn test_intra_package_call_skips_whitelist() {
        let manager = owner_manager();
        let proxy = FirewallProxy::wrap(manager.clone(), counter(&manager)).unwrap();

        assert_eq!(proxy.call::<Secret>(2), Ok(2));
        assert_eq!(proxy.call::<Ping>(()), Ok((Some(aid("F0AA000001")), 1)));
    }

    #[test]
    fn test_identity_and_display() {
        let manager = owner_manager();
        let a = FirewallProxy::wrap(manager.clone(), counter(&manager)).unwrap();
        let b = FirewallProxy::wrap(manager.clone(), counter(&manager)).unwrap();

        assert_eq!(a, a);
        assert_ne!(a, b);
        let set: HashSet<ProxyId> = [a.id(), b.id()].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(a.to_string(), "FirewallProxy bound to F0AA000000 for Counter");
    }
}
