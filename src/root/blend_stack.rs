use crate::foundation::ids::RigInstanceId;
use crate::root::instance::RigInstance;

/// How a layer's stack treats its instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendStackKind {
    /// Newest on top; full-weight top discards everything below.
    Transient,
    /// Sorted by order key; instances stay until deactivated.
    Persistent,
}

/// Instances of one layer, bottom first.
#[derive(Debug)]
pub struct BlendStack {
    kind: BlendStackKind,
    entries: Vec<RigInstance>,
}

impl BlendStack {
    pub(crate) fn new(kind: BlendStackKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    /// Stack kind.
    pub fn kind(&self) -> BlendStackKind {
        self.kind
    }

    /// Instances, bottom first.
    pub fn entries(&self) -> &[RigInstance] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [RigInstance] {
        &mut self.entries
    }

    /// Return `true` when nothing runs on this layer.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top instance.
    pub fn top(&self) -> Option<&RigInstance> {
        self.entries.last()
    }

    pub(crate) fn find(&self, id: RigInstanceId) -> Option<&RigInstance> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub(crate) fn find_mut(&mut self, id: RigInstanceId) -> Option<&mut RigInstance> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    /// Add an instance: on top for transient stacks, after every entry with an order key
    /// lower or equal for persistent ones.
    pub(crate) fn insert(&mut self, instance: RigInstance) {
        match self.kind {
            BlendStackKind::Transient => self.entries.push(instance),
            BlendStackKind::Persistent => {
                let pos = self
                    .entries
                    .iter()
                    .position(|e| e.order_key > instance.order_key)
                    .unwrap_or(self.entries.len());
                self.entries.insert(pos, instance);
            }
        }
    }

    pub(crate) fn remove(&mut self, id: RigInstanceId) -> Option<RigInstance> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos))
    }

    pub(crate) fn remove_where(
        &mut self,
        mut pred: impl FnMut(&RigInstance) -> bool,
    ) -> Vec<RigInstance> {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if pred(&self.entries[i]) {
                removed.push(self.entries.remove(i));
            } else {
                i += 1;
            }
        }
        removed
    }

    pub(crate) fn advance(&mut self, delta_time: f64) {
        for e in &mut self.entries {
            e.blend.advance(delta_time);
        }
    }

    /// Weight an entry is blended with. The bottom of a transient stack replaces what is
    /// below it unless it is blending out.
    pub(crate) fn effective_weight(&self, index: usize) -> f64 {
        let e = &self.entries[index];
        if self.kind == BlendStackKind::Transient && index == 0 && !e.is_blending_out() {
            1.0
        } else {
            e.blend.weight()
        }
    }

    /// Drop finished instances and, on transient stacks, everything under a full-weight
    /// entry.
    pub(crate) fn collect_finished(&mut self) -> Vec<RigInstance> {
        let mut removed = self.remove_where(|e| e.blend.is_finished());
        if self.kind == BlendStackKind::Transient {
            if let Some(full) = self.entries.iter().rposition(|e| e.blend.is_full()) {
                let below: Vec<_> = self.entries.drain(..full).collect();
                removed.extend(below);
            }
        }
        removed
    }
}
