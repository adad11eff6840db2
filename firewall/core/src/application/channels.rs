// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Logical Channels
//!
//! A card exposes up to [`MAX_LOGICAL_CHANNELS`] logical channels. Each channel
//! owns an independent [`SharedContextManager`]; selection on one channel never
//! disturbs the stack of another.
//!
//! [`ChannelSet`] is also a [`ContextSource`]: a proxy wrapped with a channel
//! set consults whichever channel is active **at call time**.
//!
//! # Architecture
//!
//! - **Layer:** Application
//! - **Used by:** command dispatch loop, [`crate::infrastructure::firewall::FirewallProxy`]

use std::cell::Cell;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::aid::Aid;
use crate::domain::card_config::{CardConfigManifest, MAX_LOGICAL_CHANNELS};
use crate::domain::context::{ContextError, ContextSource, ExecutionContext, SharedContextManager};

use super::identity_registry::IdentityRegistry;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Logical channel count must be between 1 and 20, got {0}")]
    InvalidChannelCount(usize),

    #[error("Logical channel {channel} does not exist (card has {count})")]
    OutOfRange { channel: usize, count: usize },

    #[error("Applet {0} is not registered to any package")]
    UnknownApplet(Aid),

    #[error(transparent)]
    Context(#[from] ContextError),
}

#[derive(Debug)]
struct Channels {
    managers: Vec<SharedContextManager>,
    active: Cell<usize>,
}

/// Fixed set of logical channels. Clones share the same channels.
#[derive(Debug, Clone)]
pub struct ChannelSet {
    inner: Rc<Channels>,
}

impl ChannelSet {
    pub fn new(count: usize) -> Result<Self, ChannelError> {
        if count == 0 || count > usize::from(MAX_LOGICAL_CHANNELS) {
            return Err(ChannelError::InvalidChannelCount(count));
        }
        Ok(Self {
            inner: Rc::new(Channels {
                managers: (0..count).map(|_| SharedContextManager::new()).collect(),
                active: Cell::new(0),
            }),
        })
    }

    pub fn from_config(config: &CardConfigManifest) -> Result<Self, ChannelError> {
        Self::new(usize::from(config.spec.logical_channels))
    }

    pub fn count(&self) -> usize {
        self.inner.managers.len()
    }

    /// Make `channel` the one subsequent commands (and proxy calls) run on.
    pub fn select_channel(&self, channel: usize) -> Result<(), ChannelError> {
        self.check(channel)?;
        if self.inner.active.replace(channel) != channel {
            debug!(channel, "Switched logical channel");
        }
        Ok(())
    }

    pub fn active_channel(&self) -> usize {
        self.inner.active.get()
    }

    /// Context manager of one channel.
    pub fn channel(&self, channel: usize) -> Result<SharedContextManager, ChannelError> {
        self.check(channel)?;
        Ok(self.inner.managers[channel].clone())
    }

    /// Select `applet` on the active channel: the channel's stack is cleared and
    /// the applet's context becomes its only frame.
    pub fn select_applet(
        &self,
        applet: Aid,
        registry: &IdentityRegistry,
    ) -> Result<ExecutionContext, ChannelError> {
        let package = registry
            .package_of(&applet)
            .ok_or(ChannelError::UnknownApplet(applet))?;
        let manager = self.active_manager();
        manager.clear();
        manager.enter_context(package, applet)?;
        info!(channel = self.active_channel(), applet = %applet, package = %package, "Applet selected");
        Ok(ExecutionContext::new(package, applet))
    }

    /// Clear the active channel's stack.
    pub fn deselect(&self) {
        debug!(channel = self.active_channel(), "Applet deselected");
        self.active_manager().clear();
    }

    /// Full card reset: every channel is cleared and channel 0 becomes active.
    pub fn reset(&self) {
        for manager in &self.inner.managers {
            manager.clear();
        }
        self.inner.active.set(0);
        info!(channels = self.count(), "Card reset");
    }

    fn active_manager(&self) -> SharedContextManager {
        self.inner.managers[self.inner.active.get()].clone()
    }

    fn check(&self, channel: usize) -> Result<(), ChannelError> {
        if channel >= self.count() {
            return Err(ChannelError::OutOfRange {
                channel,
                count: self.count(),
            });
        }
        Ok(())
    }
}

impl ContextSource for ChannelSet {
    fn context_manager(&self) -> SharedContextManager {
        self.active_manager()
    }
}
