// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Capability Surface Value Object
//!
//! Only methods declared on **capability-tagged** interfaces may be called across
//! a package boundary. An interface is capability-tagged when it is the
//! [`SHAREABLE`] marker or extends it, directly or transitively.
//!
//! Interfaces and types register their shape statically as
//! [`InterfaceDescriptor`] / [`TypeDescriptor`] values; the
//! [`CapabilitySurface`] is resolved from them once, when an object is wrapped.
//!
//! ## Surface Construction
//!
//! 1. Collect the interfaces of the type and of every ancestor type
//!    ([`TypeDescriptor::all_interfaces`]).
//! 2. Keep the capability-tagged ones ([`InterfaceDescriptor::is_capability`]).
//! 3. Union their methods plus the methods of their capability-tagged parents.
//!
//! Methods reachable only through a non-capability interface, or declared only
//! on the type itself, never enter the surface.
//!
//! ```
//! use cardsim_core::domain::capability::*;
//!
//! const PING: MethodId = MethodId::new("ping()S");
//! const RESET: MethodId = MethodId::new("reset()V");
//!
//! static PINGABLE: InterfaceDescriptor = InterfaceDescriptor {
//!     name: "Pingable",
//!     extends: &[&SHAREABLE],
//!     methods: &[PING],
//! };
//! static COUNTER: TypeDescriptor = TypeDescriptor {
//!     name: "Counter",
//!     parent: None,
//!     interfaces: &[&PINGABLE],
//!     methods: &[RESET],
//! };
//!
//! let surface = CapabilitySurface::of(&COUNTER);
//! assert!(surface.contains(PING));
//! assert!(!surface.contains(RESET));
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

/// Symbolic method identifier: the method's signature, e.g. `"s1()S"`.
///
/// Two interfaces declaring the same signature name the same method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MethodId(&'static str);

impl MethodId {
    pub const fn new(signature: &'static str) -> Self {
        Self(signature)
    }

    pub const fn signature(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Static shape of one interface.
#[derive(Debug)]
pub struct InterfaceDescriptor {
    pub name: &'static str,
    /// Direct super-interfaces.
    pub extends: &'static [&'static InterfaceDescriptor],
    /// Methods declared on this interface itself.
    pub methods: &'static [MethodId],
}

/// The capability marker every exportable interface extends.
pub static SHAREABLE: InterfaceDescriptor = InterfaceDescriptor {
    name: "Shareable",
    extends: &[],
    methods: &[],
};

impl InterfaceDescriptor {
    /// True for [`SHAREABLE`] and every interface that extends it.
    pub fn is_capability(&self) -> bool {
        std::ptr::eq(self, &SHAREABLE) || self.extends.iter().any(|parent| parent.is_capability())
    }

    /// Methods of this interface and of its capability-tagged ancestors.
    fn collect_methods(&self, into: &mut HashSet<MethodId>) {
        into.extend(self.methods.iter().copied());
        for parent in self.extends {
            if parent.is_capability() {
                parent.collect_methods(into);
            }
        }
    }
}

/// Static shape of a concrete type: its directly implemented interfaces, its
/// own methods and its parent type. `parent: None` marks the top of the chain.
#[derive(Debug)]
pub struct TypeDescriptor {
    pub name: &'static str,
    pub parent: Option<&'static TypeDescriptor>,
    pub interfaces: &'static [&'static InterfaceDescriptor],
    /// Methods declared on the type outside any interface.
    pub methods: &'static [MethodId],
}

impl TypeDescriptor {
    /// Interfaces implemented directly by this type or any ancestor, nearest
    /// type first.
    pub fn all_interfaces(&self) -> Vec<&'static InterfaceDescriptor> {
        let mut interfaces = Vec::new();
        let mut current = Some(self);
        while let Some(ty) = current {
            interfaces.extend(ty.interfaces.iter().copied());
            current = ty.parent;
        }
        interfaces
    }
}

/// Implemented by every object that may be exported to another package.
pub trait Shareable {
    fn type_descriptor(&self) -> &'static TypeDescriptor;
}

/// Type-level name of one interface method: its [`MethodId`] and its call
/// signature. Usually a zero-sized marker type per method.
pub trait CapabilityMethod: 'static {
    const ID: MethodId;
    type Args;
    type Output;
    type Error;
}

/// Implementation of method `M` on an exported type.
///
/// A proxy only ever runs `<T as Handles<M>>::handle` for a call checked
/// against `M::ID`, so the whitelisted identifier and the executed code are
/// the same method.
pub trait Handles<M: CapabilityMethod> {
    fn handle(&self, args: M::Args) -> Result<M::Output, M::Error>;
}

/// Frozen method whitelist for one wrapped object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySurface {
    methods: HashSet<MethodId>,
    interfaces: Vec<&'static str>,
}

impl CapabilitySurface {
    /// Resolve the surface of a concrete type.
    pub fn of(ty: &TypeDescriptor) -> Self {
        Self::from_interfaces(&ty.all_interfaces())
    }

    /// Resolve the surface contributed by an explicit interface list.
    pub fn from_interfaces(interfaces: &[&'static InterfaceDescriptor]) -> Self {
        let mut methods = HashSet::new();
        let mut names: Vec<&'static str> = Vec::new();
        for interface in interfaces.iter().filter(|i| i.is_capability()) {
            interface.collect_methods(&mut methods);
            if !names.contains(&interface.name) {
                names.push(interface.name);
            }
        }
        Self { methods, interfaces: names }
    }

    pub fn contains(&self, method: MethodId) -> bool {
        self.methods.contains(&method)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Whitelisted methods in signature order.
    pub fn methods(&self) -> Vec<MethodId> {
        let mut methods: Vec<MethodId> = self.methods.iter().copied().collect();
        methods.sort();
        methods
    }

    /// Names of the retained capability interfaces, in discovery order.
    pub fn interfaces(&self) -> &[&'static str] {
        &self.interfaces
    }
}
