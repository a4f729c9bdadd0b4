use crate::foundation::core::Rotator;
use crate::foundation::error::{CamRigError, CamRigResult};
use crate::foundation::ids::{DataId, VariableId};
use crate::result::allocation::{AllocationInfo, VariableValue};

/// Values that can live in a [`SlotTable`].
pub trait SlotValue: Clone + PartialEq + std::fmt::Debug {
    /// Return `true` when `other` may be written into a slot currently holding `self`.
    fn same_kind(&self, other: &Self) -> bool;

    /// Interpolate towards `other`.
    fn blend(&self, other: &Self, alpha: f64) -> Self;
}

impl SlotValue for VariableValue {
    fn same_kind(&self, other: &Self) -> bool {
        self.value_type() == other.value_type()
    }

    fn blend(&self, other: &Self, alpha: f64) -> Self {
        match (*self, *other) {
            (Self::Float(a), Self::Float(b)) => Self::Float(a + (b - a) * alpha),
            (Self::Int(a), Self::Int(b)) => {
                let v = f64::from(a) + f64::from(b - a) * alpha;
                Self::Int(v.round() as i32)
            }
            (Self::Vector(a), Self::Vector(b)) => Self::Vector(a.lerp(b, alpha)),
            (Self::Rotator(a), Self::Rotator(b)) => Self::Rotator(Rotator::lerp(a, b, alpha)),
            _ => {
                if alpha >= 0.5 {
                    *other
                } else {
                    *self
                }
            }
        }
    }
}

impl SlotValue for serde_json::Value {
    fn same_kind(&self, _other: &Self) -> bool {
        true
    }

    fn blend(&self, other: &Self, alpha: f64) -> Self {
        if alpha >= 0.5 {
            other.clone()
        } else {
            self.clone()
        }
    }
}

/// Flags carried by each slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotFlags {
    /// Written since allocation or the last reset.
    pub written: bool,
    /// Written during the current frame.
    pub written_this_frame: bool,
    /// Reverted to its default at the end of every frame.
    pub auto_reset: bool,
    /// Rig-private state.
    pub private: bool,
}

/// One allocated slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot<K, V> {
    /// Slot key.
    pub id: K,
    /// Current value.
    pub value: V,
    /// Value restored on reset.
    pub default_value: V,
    /// Slot flags.
    pub flags: SlotFlags,
}

/// Which slots a table-to-table transfer considers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotFilter {
    /// Every written slot.
    All,
    /// Written private slots only.
    Private,
    /// Written public slots only.
    Public,
    /// Slots written during the current frame.
    WrittenThisFrame,
}

impl SlotFilter {
    fn accepts(self, flags: SlotFlags) -> bool {
        if !flags.written {
            return false;
        }
        match self {
            Self::All => true,
            Self::Private => flags.private,
            Self::Public => !flags.private,
            Self::WrittenThisFrame => flags.written_this_frame,
        }
    }
}

/// Sparse slot table with a layout fixed at allocation time.
///
/// Slots are kept sorted by key. Writes to unallocated keys are rejected.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotTable<K, V> {
    slots: Vec<Slot<K, V>>,
}

impl<K, V> Default for SlotTable<K, V> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

/// Variable table: typed values keyed by [`VariableId`].
pub type VariableTable = SlotTable<VariableId, VariableValue>;

/// Data table: JSON blobs keyed by [`DataId`].
pub type DataTable = SlotTable<DataId, serde_json::Value>;

impl<K, V> SlotTable<K, V>
where
    K: Copy + Ord + std::fmt::Debug,
    V: SlotValue,
{
    /// Add a slot if `id` is not allocated yet. Existing slots are left untouched.
    pub(crate) fn allocate_slot(&mut self, id: K, default_value: V, auto_reset: bool, private: bool) {
        match self.slots.binary_search_by(|s| s.id.cmp(&id)) {
            Ok(_) => {}
            Err(pos) => self.slots.insert(
                pos,
                Slot {
                    id,
                    value: default_value.clone(),
                    default_value,
                    flags: SlotFlags {
                        auto_reset,
                        private,
                        ..SlotFlags::default()
                    },
                },
            ),
        }
    }

    fn index_of(&self, id: K) -> Option<usize> {
        self.slots.binary_search_by(|s| s.id.cmp(&id)).ok()
    }

    /// Number of allocated slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Return `true` when no slot is allocated.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Return `true` when `id` is allocated.
    pub fn contains(&self, id: K) -> bool {
        self.index_of(id).is_some()
    }

    /// Iterate slots in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Slot<K, V>> {
        self.slots.iter()
    }

    /// Slot for `id`.
    pub fn slot(&self, id: K) -> Option<&Slot<K, V>> {
        self.index_of(id).map(|i| &self.slots[i])
    }

    /// Current value of `id` (its default when never written).
    pub fn get(&self, id: K) -> Option<&V> {
        self.slot(id).map(|s| &s.value)
    }

    /// Value of `id` only if it has been written.
    pub fn get_written(&self, id: K) -> Option<&V> {
        self.slot(id).filter(|s| s.flags.written).map(|s| &s.value)
    }

    /// Return `true` when `id` has been written since allocation or reset.
    pub fn is_written(&self, id: K) -> bool {
        self.slot(id).is_some_and(|s| s.flags.written)
    }

    /// Return `true` when `id` was written during the current frame.
    pub fn was_written_this_frame(&self, id: K) -> bool {
        self.slot(id).is_some_and(|s| s.flags.written_this_frame)
    }

    /// Write `value` into the slot `id`.
    pub fn set(&mut self, id: K, value: V) -> CamRigResult<()> {
        let Some(i) = self.index_of(id) else {
            return Err(CamRigError::configuration(format!(
                "slot {id:?} is not allocated in this table"
            )));
        };
        let slot = &mut self.slots[i];
        if !slot.default_value.same_kind(&value) {
            return Err(CamRigError::configuration(format!(
                "slot {id:?} holds {:?}, cannot write {value:?}",
                slot.default_value
            )));
        }
        slot.value = value;
        slot.flags.written = true;
        slot.flags.written_this_frame = true;
        Ok(())
    }

    /// Clear every `written_this_frame` flag.
    pub fn clear_written_this_frame_flags(&mut self) {
        for slot in &mut self.slots {
            slot.flags.written_this_frame = false;
        }
    }

    /// Revert auto-reset slots to their default and clear their `written` flag.
    pub fn auto_reset_values(&mut self) {
        for slot in self.slots.iter_mut().filter(|s| s.flags.auto_reset) {
            slot.value = slot.default_value.clone();
            slot.flags.written = false;
        }
    }

    /// Revert a single slot, whatever its auto-reset flag.
    pub fn reset_value(&mut self, id: K) {
        if let Some(i) = self.index_of(id) {
            let slot = &mut self.slots[i];
            slot.value = slot.default_value.clone();
            slot.flags.written = false;
            slot.flags.written_this_frame = false;
        }
    }

    /// Revert every slot to its default and clear all write flags.
    pub fn reset_all(&mut self) {
        for slot in &mut self.slots {
            slot.value = slot.default_value.clone();
            slot.flags.written = false;
            slot.flags.written_this_frame = false;
        }
    }

    /// Copy `other`'s slots accepted by `filter` into matching slots of `self`.
    ///
    /// Keys missing from `self` and kind mismatches are skipped. The destination keeps its
    /// layout; the `written_this_frame` flag follows the source.
    pub fn override_from(&mut self, other: &SlotTable<K, V>, filter: SlotFilter) {
        self.transfer_from(other, filter, |_, src| src.clone());
    }

    /// Like [`SlotTable::override_from`] but interpolates slots already written in `self`.
    pub fn lerp_from(&mut self, other: &SlotTable<K, V>, filter: SlotFilter, alpha: f64) {
        if alpha >= 1.0 {
            self.override_from(other, filter);
            return;
        }
        self.transfer_from(other, filter, |dst, src| {
            if dst.flags.written {
                dst.value.blend(src, alpha)
            } else {
                src.clone()
            }
        });
    }

    fn transfer_from(
        &mut self,
        other: &SlotTable<K, V>,
        filter: SlotFilter,
        mut value_for: impl FnMut(&Slot<K, V>, &V) -> V,
    ) {
        for src in other.slots.iter().filter(|s| filter.accepts(s.flags)) {
            let Some(i) = self.index_of(src.id) else {
                continue;
            };
            let dst = &mut self.slots[i];
            if !dst.default_value.same_kind(&src.value) {
                continue;
            }
            dst.value = value_for(dst, &src.value);
            dst.flags.written = true;
            dst.flags.written_this_frame |= src.flags.written_this_frame;
        }
    }
}

impl VariableTable {
    /// Allocate the variable slots described by `info` that are not present yet.
    pub fn allocate(&mut self, info: &AllocationInfo) {
        for def in &info.variables {
            self.allocate_slot(def.id, def.default_value, def.auto_reset, def.private);
        }
    }
}

impl DataTable {
    /// Allocate the data slots described by `info` that are not present yet.
    pub fn allocate(&mut self, info: &AllocationInfo) {
        for def in &info.data {
            self.allocate_slot(def.id, def.default_value.clone(), def.auto_reset, false);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/result/table.rs"]
mod tests;
