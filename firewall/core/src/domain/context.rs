// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Execution Context Domain Module
//!
//! "Whose code is running right now." Each logical channel owns one
//! [`ContextManager`], a strictly nested stack of [`ExecutionContext`] frames.
//!
//! ## Stack Discipline
//!
//! ```text
//! select applet A2 (P2)          [ (P2,A2) ]
//!   └─ A2 calls proxy of A1      [ (P2,A2), (P1,A1) ]   ← FirewallProxy enters
//!         └─ A1 returns          [ (P2,A2) ]            ← ContextGuard leaves
//! deselect / card reset          [ ]
//! ```
//!
//! - Frames are pushed only by [`ContextManager::enter_context`] and popped only
//!   by [`ContextManager::leave_context`]; leaving an empty stack is a no-op.
//! - Frames of the caller's own package are transparent to
//!   [`ContextManager::previous_context_applet_id`]: only the nearest foreign
//!   caller is reported.
//!
//! ## Sharing
//!
//! [`SharedContextManager`] is the single-threaded handle (`Rc<RefCell<_>>`)
//! handed to proxies and to the dispatch loop. It is `!Send`; a host
//! running channels on several threads gives each thread its own managers.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use super::aid::Aid;

/// Rejected [`ContextManager::enter_context`] arguments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("Cannot enter a context without a package AID")]
    MissingPackageId,

    #[error("Cannot enter a context without an applet AID")]
    MissingAppletId,
}

/// Immutable (package, applet) pair identifying the running code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExecutionContext {
    package_id: Aid,
    applet_id: Aid,
}

impl ExecutionContext {
    pub fn new(package_id: Aid, applet_id: Aid) -> Self {
        Self { package_id, applet_id }
    }

    pub fn package_id(&self) -> Aid {
        self.package_id
    }

    pub fn applet_id(&self) -> Aid {
        self.applet_id
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExecutionContext{{package={}, applet={}}}", self.package_id, self.applet_id)
    }
}

/// Per-channel stack of execution contexts.
#[derive(Debug, Default, Clone)]
pub struct ContextManager {
    stack: Vec<ExecutionContext>,
}

impl ContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every frame. Used on a full card reset and on deselection.
    pub fn clear(&mut self) {
        if !self.stack.is_empty() {
            trace!(depth = self.stack.len(), "Clearing execution context stack");
        }
        self.stack.clear();
    }

    /// Push a new frame for `(package_id, applet_id)`.
    ///
    /// Accepts either plain [`Aid`]s or `Option<Aid>` so that identities read
    /// back from [`Self::active_package_id`] can be passed straight through.
    ///
    /// # Errors
    ///
    /// - [`ContextError::MissingPackageId`] — `package_id` is `None`
    /// - [`ContextError::MissingAppletId`] — `applet_id` is `None`
    ///
    /// The stack is unchanged on error.
    pub fn enter_context(
        &mut self,
        package_id: impl Into<Option<Aid>>,
        applet_id: impl Into<Option<Aid>>,
    ) -> Result<(), ContextError> {
        let package_id = package_id.into().ok_or(ContextError::MissingPackageId)?;
        let applet_id = applet_id.into().ok_or(ContextError::MissingAppletId)?;
        self.push(ExecutionContext::new(package_id, applet_id));
        Ok(())
    }

    /// Push an already validated frame.
    pub fn push(&mut self, context: ExecutionContext) {
        self.stack.push(context);
        trace!(
            package = %context.package_id,
            applet = %context.applet_id,
            depth = self.stack.len(),
            "Entered execution context"
        );
    }

    /// Pop the most recently entered frame. Returns `None` (and does nothing)
    /// when the stack is already empty.
    pub fn leave_context(&mut self) -> Option<ExecutionContext> {
        let left = self.stack.pop();
        if let Some(context) = &left {
            trace!(
                package = %context.package_id,
                applet = %context.applet_id,
                depth = self.stack.len(),
                "Left execution context"
            );
        }
        left
    }

    pub fn active_context(&self) -> Option<ExecutionContext> {
        self.stack.last().copied()
    }

    pub fn active_applet_id(&self) -> Option<Aid> {
        self.stack.last().map(|c| c.applet_id)
    }

    pub fn active_package_id(&self) -> Option<Aid> {
        self.stack.last().map(|c| c.package_id)
    }

    /// Applet of the nearest frame below the top whose package differs from the
    /// top frame's package.
    ///
    /// Returns `None` when the stack holds at most one frame or every frame
    /// below the top belongs to the active package.
    pub fn previous_context_applet_id(&self) -> Option<Aid> {
        let (current, below) = self.stack.split_last()?;
        below
            .iter()
            .rev()
            .find(|frame| frame.package_id != current.package_id)
            .map(|frame| frame.applet_id)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Frame at `index`, counted from the bottom of the stack.
    pub fn frame_at(&self, index: usize) -> Option<ExecutionContext> {
        self.stack.get(index).copied()
    }

    /// Leave contexts until at most `depth` frames remain.
    pub fn unwind_to(&mut self, depth: usize) {
        while self.stack.len() > depth {
            self.leave_context();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Frames from bottom (first entered) to top (active).
    pub fn frames(&self) -> &[ExecutionContext] {
        &self.stack
    }
}

/// Shared single-threaded handle to one channel's [`ContextManager`].
///
/// Every method borrows the manager only for its own duration, so a callee
/// running inside a forwarded call can query the same manager freely.
#[derive(Debug, Clone, Default)]
pub struct SharedContextManager(Rc<RefCell<ContextManager>>);

impl SharedContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_context(
        &self,
        package_id: impl Into<Option<Aid>>,
        applet_id: impl Into<Option<Aid>>,
    ) -> Result<(), ContextError> {
        self.0.borrow_mut().enter_context(package_id, applet_id)
    }

    pub fn push(&self, context: ExecutionContext) {
        self.0.borrow_mut().push(context);
    }

    pub fn leave_context(&self) -> Option<ExecutionContext> {
        self.0.borrow_mut().leave_context()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn active_context(&self) -> Option<ExecutionContext> {
        self.0.borrow().active_context()
    }

    pub fn active_applet_id(&self) -> Option<Aid> {
        self.0.borrow().active_applet_id()
    }

    pub fn active_package_id(&self) -> Option<Aid> {
        self.0.borrow().active_package_id()
    }

    pub fn previous_context_applet_id(&self) -> Option<Aid> {
        self.0.borrow().previous_context_applet_id()
    }

    pub fn depth(&self) -> usize {
        self.0.borrow().depth()
    }

    pub fn frame_at(&self, index: usize) -> Option<ExecutionContext> {
        self.0.borrow().frame_at(index)
    }

    pub fn unwind_to(&self, depth: usize) {
        self.0.borrow_mut().unwind_to(depth);
    }

    /// Copy of the current frames, bottom first.
    pub fn snapshot(&self) -> Vec<ExecutionContext> {
        self.0.borrow().frames().to_vec()
    }

    /// True when both handles point at the same manager.
    pub fn same_manager(&self, other: &SharedContextManager) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Supplies the context manager a firewall decision consults.
///
/// Resolved on every call rather than captured once, so a proxy bound to a
/// [`crate::application::ChannelSet`] always sees the channel that is active
/// at call time.
pub trait ContextSource {
    fn context_manager(&self) -> SharedContextManager;
}

impl ContextSource for SharedContextManager {
    fn context_manager(&self) -> SharedContextManager {
        self.clone()
    }
}

impl<S: ContextSource + ?Sized> ContextSource for Rc<S> {
    fn context_manager(&self) -> SharedContextManager {
        (**self).context_manager()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aid(s: &str) -> Aid {
        s.parse().unwrap()
    }

    #[test]
    fn test_enter_requires_both_identities() {
        let mut manager = ContextManager::new();
        assert_eq!(
            manager.enter_context(None::<Aid>, aid("F0AA000001")),
            Err(ContextError::MissingPackageId)
        );
        assert_eq!(
            manager.enter_context(aid("F0AA000000"), None::<Aid>),
            Err(ContextError::MissingAppletId)
        );
        assert_eq!(manager.depth(), 0);
    }

    #[test]
    fn test_leave_on_empty_stack_is_noop() {
        let mut manager = ContextManager::new();
        assert_eq!(manager.leave_context(), None);
        assert_eq!(manager.leave_context(), None);
        assert!(manager.is_empty());
        assert_eq!(manager.active_applet_id(), None);
        assert_eq!(manager.active_package_id(), None);
    }

    #[test]
    fn test_enter_then_leave_restores_active_identity() {
        let mut manager = ContextManager::new();
        manager.enter_context(aid("F0AA000000"), aid("F0AA000001")).unwrap();
        let before = (manager.active_package_id(), manager.active_applet_id());

        manager.enter_context(aid("F0BB000000"), aid("F0BB000001")).unwrap();
        assert_eq!(manager.active_applet_id(), Some(aid("F0BB000001")));
        manager.leave_context();

        assert_eq!((manager.active_package_id(), manager.active_applet_id()), before);
        assert_eq!(manager.depth(), 1);
    }

    #[test]
    fn test_previous_context_skips_same_package_frames() {
        let mut manager = ContextManager::new();
        assert_eq!(manager.previous_context_applet_id(), None);

        manager.enter_context(aid("F0AA000010"), aid("F0AA000011")).unwrap();
        assert_eq!(manager.previous_context_applet_id(), None);
        manager.enter_context(aid("F0AA000010"), aid("F0AA000012")).unwrap();
        assert_eq!(manager.previous_context_applet_id(), None);
        manager.enter_context(aid("F0AA000010"), aid("F0AA000013")).unwrap();
        assert_eq!(manager.previous_context_applet_id(), None);

        manager.enter_context(aid("F0BB000010"), aid("F0BB000001")).unwrap();
        assert_eq!(manager.previous_context_applet_id(), Some(aid("F0AA000013")));

        // A second frame of the foreign package is still transparent
        manager.enter_context(aid("F0BB000010"), aid("F0BB000002")).unwrap();
        assert_eq!(manager.previous_context_applet_id(), Some(aid("F0AA000013")));
    }

    #[test]
    fn test_unwind_to_leaves_frames_above_depth() {
        let mut manager = ContextManager::new();
        manager.enter_context(aid("F0AA000000"), aid("F0AA000001")).unwrap();
        manager.enter_context(aid("F0BB000000"), aid("F0BB000001")).unwrap();
        manager.enter_context(aid("F0AA000000"), aid("F0AA000002")).unwrap();

        assert_eq!(manager.frame_at(1).map(|f| f.applet_id()), Some(aid("F0BB000001")));
        assert_eq!(manager.frame_at(3), None);

        manager.unwind_to(1);
        assert_eq!(manager.depth(), 1);
        assert_eq!(manager.active_applet_id(), Some(aid("F0AA000001")));
        manager.unwind_to(5);
        assert_eq!(manager.depth(), 1);
    }

    #[test]
    fn test_clear_empties_stack() {
        let shared = SharedContextManager::new();
        shared.enter_context(aid("F0AA000000"), aid("F0AA000001")).unwrap();
        shared.enter_context(aid("F0BB000000"), aid("F0BB000001")).unwrap();
        assert_eq!(shared.depth(), 2);
        shared.clear();
        assert_eq!(shared.depth(), 0);
        assert_eq!(shared.active_context(), None);
    }

    #[test]
    fn test_shared_handles_alias_one_stack() {
        let a = SharedContextManager::new();
        let b = a.clone();
        a.enter_context(aid("F0AA000000"), aid("F0AA000001")).unwrap();
        assert_eq!(b.active_applet_id(), Some(aid("F0AA000001")));
        assert!(a.same_manager(&b));
        assert!(!a.same_manager(&SharedContextManager::new()));
    }
}
