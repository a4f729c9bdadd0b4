use std::collections::BTreeMap;

use crate::foundation::ids::VariableId;
use crate::result::evaluation_result::EvaluationResult;
use crate::system::service::{EvaluationService, ServiceUpdateParams};

/// Resets runtime-registered variables on the aggregate result after each frame unless
/// something wrote them that frame.
///
/// Registrations are counted: a variable stays registered until it was unregistered as
/// many times as it was registered.
#[derive(Debug, Default)]
pub struct AutoResetVariableService {
    counts: BTreeMap<VariableId, u32>,
}

impl AutoResetVariableService {
    /// Empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one reference to `id`.
    pub fn register_variable(&mut self, id: VariableId) {
        *self.counts.entry(id).or_insert(0) += 1;
    }

    /// Drop one reference to `id`. Returns `false` when `id` was not registered.
    pub fn unregister_variable(&mut self, id: VariableId) -> bool {
        let Some(count) = self.counts.get_mut(&id) else {
            tracing::warn!(variable = id.0, "unregistering unknown auto-reset variable");
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&id);
        }
        true
    }

    /// Return `true` while `id` holds at least one reference.
    pub fn is_registered(&self, id: VariableId) -> bool {
        self.counts.contains_key(&id)
    }

    /// Reference count of `id`.
    pub fn reference_count(&self, id: VariableId) -> u32 {
        self.counts.get(&id).copied().unwrap_or(0)
    }
}

impl EvaluationService for AutoResetVariableService {
    fn on_post_update(&mut self, _params: &ServiceUpdateParams, result: &mut EvaluationResult) {
        for id in self.counts.keys() {
            if !result.variable_table.was_written_this_frame(*id) {
                result.variable_table.reset_value(*id);
            }
        }
    }

    fn teardown(&mut self) {
        self.counts.clear();
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/system/services/auto_reset.rs"]
mod tests;
