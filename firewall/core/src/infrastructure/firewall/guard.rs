// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use tracing::warn;

use crate::domain::context::{ExecutionContext, SharedContextManager};

/// Scoped context switch. Entering pushes a frame; dropping the guard leaves
/// it again, whether the guarded call returned, failed or unwound.
///
/// On drop the guard only touches the stack if its own frame is still at the
/// position it was pushed to. Frames a callee left above it are unwound with
/// it; a stack the callee replaced (e.g. by re-selecting an applet) is left
/// alone.
#[must_use = "the context is left as soon as the guard is dropped"]
pub struct ContextGuard {
    manager: SharedContextManager,
    context: ExecutionContext,
    depth: usize,
}

impl ContextGuard {
    pub fn enter(manager: &SharedContextManager, context: ExecutionContext) -> Self {
        manager.push(context);
        Self {
            manager: manager.clone(),
            context,
            depth: manager.depth(),
        }
    }

    /// Stack depth including the guarded frame.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let index = self.depth - 1;
        match self.manager.frame_at(index) {
            Some(frame) if frame == self.context => {
                let actual = self.manager.depth();
                if actual != self.depth {
                    warn!(
                        expected = self.depth,
                        actual,
                        "Guarded call left extra execution contexts on the stack"
                    );
                }
                self.manager.unwind_to(index);
            }
            _ => {
                warn!(
                    context = %self.context,
                    depth = self.depth,
                    "Guarded execution context was replaced during the call; stack left as is"
                );
            }
        }
    }
}
