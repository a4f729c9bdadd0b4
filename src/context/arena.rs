use crate::context::context::EvaluationContext;
use crate::foundation::error::{CamRigError, CamRigResult};

/// Generational handle to an [`EvaluationContext`].
///
/// Handles are weak: once the context is destroyed every lookup through an old handle
/// fails, even if the slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextHandle {
    index: u32,
    generation: u32,
}

impl ContextHandle {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index, for diagnostics.
    pub fn index(self) -> u32 {
        self.index
    }
}

#[derive(Debug)]
struct ArenaSlot {
    generation: u32,
    context: Option<EvaluationContext>,
}

/// Owner of every evaluation context.
#[derive(Debug, Default)]
pub struct ContextArena {
    slots: Vec<ArenaSlot>,
    free: Vec<u32>,
}

impl ContextArena {
    /// Empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `context` and return its handle.
    pub fn insert(&mut self, mut context: EvaluationContext) -> ContextHandle {
        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                ContextHandle::new(index, slot.generation)
            }
            None => {
                self.slots.push(ArenaSlot {
                    generation: 0,
                    context: None,
                });
                ContextHandle::new((self.slots.len() - 1) as u32, 0)
            }
        };
        context.handle = handle;
        self.slots[handle.index as usize].context = Some(context);
        handle
    }

    /// Return `true` while the context behind `handle` is alive.
    pub fn contains(&self, handle: ContextHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Context behind `handle`.
    pub fn get(&self, handle: ContextHandle) -> Option<&EvaluationContext> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.context.as_ref())
    }

    /// Mutable context behind `handle`.
    pub fn get_mut(&mut self, handle: ContextHandle) -> Option<&mut EvaluationContext> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.context.as_mut())
    }

    pub(crate) fn require(&self, handle: ContextHandle) -> CamRigResult<&EvaluationContext> {
        self.get(handle)
            .ok_or_else(|| CamRigError::protocol(format!("context {handle:?} is not alive")))
    }

    pub(crate) fn require_mut(
        &mut self,
        handle: ContextHandle,
    ) -> CamRigResult<&mut EvaluationContext> {
        self.get_mut(handle)
            .ok_or_else(|| CamRigError::protocol(format!("context {handle:?} is not alive")))
    }

    /// Handles of every live context, in slot order.
    pub fn handles(&self) -> Vec<ContextHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.context.is_some())
            .map(|(i, s)| ContextHandle::new(i as u32, s.generation))
            .collect()
    }

    /// Number of live contexts.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.context.is_some()).count()
    }

    /// Return `true` when no context is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroy `handle` and, recursively, its children. Returns the destroyed handles,
    /// children first.
    pub fn destroy(&mut self, handle: ContextHandle) -> Vec<ContextHandle> {
        let mut destroyed = Vec::new();
        let parent = self.get(handle).and_then(|c| c.parent());
        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|c| *c != handle);
        }
        self.destroy_rec(handle, &mut destroyed);
        destroyed
    }

    fn destroy_rec(&mut self, handle: ContextHandle, destroyed: &mut Vec<ContextHandle>) {
        let Some(slot) = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
        else {
            return;
        };
        let Some(mut context) = slot.context.take() else {
            return;
        };
        self.free.push(handle.index);
        for child in std::mem::take(&mut context.children) {
            self.destroy_rec(child, destroyed);
        }
        context.teardown();
        destroyed.push(handle);
    }

    /// Make `child` a child of `parent`.
    ///
    /// Registering the same pair twice is a no-op; a child already owned by another
    /// parent is rejected.
    pub fn register_child_context(
        &mut self,
        parent: ContextHandle,
        child: ContextHandle,
    ) -> CamRigResult<()> {
        if parent == child {
            return Err(CamRigError::protocol("a context cannot be its own child"));
        }
        self.require(parent)?;
        let current = self.require(child)?.parent();
        match current {
            Some(p) if p == parent => return Ok(()),
            Some(p) => {
                return Err(CamRigError::protocol(format!(
                    "context {child:?} already has parent {p:?}"
                )));
            }
            None => {}
        }
        if self.is_ancestor(child, parent) {
            return Err(CamRigError::protocol(format!(
                "context {child:?} is an ancestor of {parent:?}"
            )));
        }
        self.require_mut(child)?.parent = Some(parent);
        self.require_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Detach `child` from `parent`. Returns `false` when they were not related.
    pub fn unregister_child_context(&mut self, parent: ContextHandle, child: ContextHandle) -> bool {
        let related = self.get(child).and_then(|c| c.parent()) == Some(parent);
        if !related {
            return false;
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = None;
        }
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        true
    }

    fn is_ancestor(&self, candidate: ContextHandle, of: ContextHandle) -> bool {
        let mut cursor = self.get(of).and_then(|c| c.parent());
        while let Some(h) = cursor {
            if h == candidate {
                return true;
            }
            cursor = self.get(h).and_then(|c| c.parent());
        }
        false
    }

    /// End-of-frame housekeeping for `handle` and its children.
    pub fn on_end_of_frame(&mut self, handle: ContextHandle) {
        let children = match self.get_mut(handle) {
            Some(ctx) => {
                ctx.on_end_of_frame();
                ctx.children.clone()
            }
            None => return,
        };
        for child in children {
            self.on_end_of_frame(child);
        }
    }

    /// Run end-of-frame housekeeping on every live context, roots first.
    pub fn on_end_of_frame_all(&mut self) {
        for handle in self.handles() {
            if self.get(handle).is_some_and(|c| c.parent().is_none()) {
                self.on_end_of_frame(handle);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/context/arena.rs"]
mod tests;
