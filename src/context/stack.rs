use crate::context::arena::{ContextArena, ContextHandle};
use crate::foundation::error::{CamRigError, CamRigResult};

/// What changed in a [`ContextStack`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextStackChange {
    /// Context pushed, or moved to the top.
    Pushed(ContextHandle),
    /// Top context popped.
    Popped(ContextHandle),
    /// Context removed from anywhere in the stack.
    Removed(ContextHandle),
    /// Stack emptied.
    Reset,
    /// Child registered under a context.
    ChildAdded {
        /// New parent.
        parent: ContextHandle,
        /// Registered child.
        child: ContextHandle,
    },
}

/// Change notification; exactly one per mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextStackEvent {
    /// The mutation.
    pub change: ContextStackChange,
    /// Top entry before the mutation.
    pub previous_top: Option<ContextHandle>,
}

/// Ordered context handles; the last live entry is the active context.
#[derive(Debug, Default)]
pub struct ContextStack {
    entries: Vec<ContextHandle>,
    events: Vec<ContextStackEvent>,
}

impl ContextStack {
    /// Empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&mut self, change: ContextStackChange, previous_top: Option<ContextHandle>) {
        self.events.push(ContextStackEvent {
            change,
            previous_top,
        });
    }

    /// Entries, bottom first. May include destroyed contexts until the next prune.
    pub fn entries(&self) -> &[ContextHandle] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return `true` when `handle` is in the stack.
    pub fn contains(&self, handle: ContextHandle) -> bool {
        self.entries.contains(&handle)
    }

    /// Last entry still alive in `arena`.
    pub fn active_context(&self, arena: &ContextArena) -> Option<ContextHandle> {
        self.entries.iter().rev().copied().find(|h| arena.contains(*h))
    }

    /// Push `handle`, moving it to the top if present.
    pub fn push_context(&mut self, handle: ContextHandle) {
        let previous = self.entries.last().copied();
        self.entries.retain(|h| *h != handle);
        self.entries.push(handle);
        self.emit(ContextStackChange::Pushed(handle), previous);
    }

    /// Pop the top entry.
    pub fn pop_context(&mut self) -> Option<ContextHandle> {
        let popped = self.entries.pop()?;
        self.emit(ContextStackChange::Popped(popped), Some(popped));
        Some(popped)
    }

    /// Remove `handle` wherever it is. Returns `false` when absent.
    pub fn remove_context(&mut self, handle: ContextHandle) -> bool {
        let previous = self.entries.last().copied();
        let before = self.entries.len();
        self.entries.retain(|h| *h != handle);
        if self.entries.len() == before {
            return false;
        }
        self.emit(ContextStackChange::Removed(handle), previous);
        true
    }

    /// Remove every entry.
    pub fn reset(&mut self) {
        let previous = self.entries.last().copied();
        self.entries.clear();
        self.emit(ContextStackChange::Reset, previous);
    }

    /// Register `child` under `parent`, or under the active context when `parent` is
    /// `None`.
    ///
    /// Fails when there is no target, or when `child` is itself a top-level stack entry.
    pub fn add_child_context(
        &mut self,
        arena: &mut ContextArena,
        child: ContextHandle,
        parent: Option<ContextHandle>,
    ) -> CamRigResult<ContextHandle> {
        let parent = match parent {
            Some(p) => p,
            None => self
                .active_context(arena)
                .ok_or_else(|| CamRigError::protocol("no active context to add a child to"))?,
        };
        if self.contains(child) {
            return Err(CamRigError::protocol(format!(
                "context {child:?} is already a top-level stack entry"
            )));
        }
        arena.register_child_context(parent, child)?;
        let previous = self.entries.last().copied();
        self.emit(ContextStackChange::ChildAdded { parent, child }, previous);
        Ok(parent)
    }

    /// Drop entries whose context was destroyed.
    pub fn prune(&mut self, arena: &ContextArena) -> usize {
        let before = self.entries.len();
        self.entries.retain(|h| arena.contains(*h));
        before - self.entries.len()
    }

    /// Pending change events, oldest first.
    pub fn drain_events(&mut self) -> Vec<ContextStackEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/context/stack.rs"]
mod tests;
