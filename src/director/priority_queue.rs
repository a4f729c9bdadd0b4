use std::sync::Arc;

use crate::context::arena::ContextHandle;
use crate::director::director::{Director, DirectorRunContext};
use crate::director::registry::DirectorFactory;
use crate::director::request::DirectorEvaluationResult;
use crate::foundation::error::CamRigResult;
use crate::rig::asset::{CameraAsset, CameraRigAsset};

/// Delegates to the director of its highest-priority child context.
///
/// Ties go to the most recently registered child. A child that loses the lead is
/// deactivated and its rigs are released.
#[derive(Debug, Default, Clone, Copy)]
pub struct PriorityQueueDirector {
    current: Option<ContextHandle>,
}

impl PriorityQueueDirector {
    /// Child picked on the last run.
    pub fn current_child(&self) -> Option<ContextHandle> {
        self.current
    }
}

impl PriorityQueueDirector {
    fn pick(run: &DirectorRunContext<'_>) -> Option<ContextHandle> {
        let arena = run.arena();
        let ctx = arena.get(run.context())?;
        ctx.children()
            .iter()
            .enumerate()
            .filter_map(|(i, h)| arena.get(*h).map(|c| ((c.priority(), i), *h)))
            .max_by_key(|(key, _)| *key)
            .map(|(_, h)| h)
    }
}

impl Director for PriorityQueueDirector {
    fn run(&mut self, run: &mut DirectorRunContext<'_>, out: &mut DirectorEvaluationResult) {
        let picked = Self::pick(run);
        if let Some(prev) = self.current.filter(|prev| Some(*prev) != picked) {
            tracing::debug!(?prev, ?picked, "child lost the lead");
            if let Err(err) = run.deactivate_child_director(prev, out) {
                tracing::warn!(child = ?prev, %err, "deactivating child director");
            }
        }
        self.current = picked;
        let Some(child) = picked else {
            return;
        };
        if let Err(err) = run.run_child_director(child, out) {
            tracing::warn!(?child, %err, "child director failed");
        }
    }
}

/// Factory for [`PriorityQueueDirector`]. Takes no params.
#[derive(Debug, Default, Clone, Copy)]
pub struct PriorityQueueDirectorFactory;

impl DirectorFactory for PriorityQueueDirectorFactory {
    fn build_director(
        &self,
        _asset: &Arc<CameraAsset>,
        _params: &serde_json::Value,
    ) -> CamRigResult<Box<dyn Director>> {
        Ok(Box::new(PriorityQueueDirector::default()))
    }

    fn gather_rig_usage(
        &self,
        _asset: &CameraAsset,
        _params: &serde_json::Value,
    ) -> CamRigResult<Vec<Arc<CameraRigAsset>>> {
        Ok(Vec::new())
    }
}
