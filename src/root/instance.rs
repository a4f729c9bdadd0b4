use std::sync::Arc;

use crate::context::arena::ContextHandle;
use crate::director::request::Layer;
use crate::foundation::ids::RigInstanceId;
use crate::result::evaluation_result::EvaluationResult;
use crate::rig::asset::CameraRigAsset;
use crate::rig::node::NodeEvaluatorTree;
use crate::rig::transition::TransitionSpec;

/// Which way an instance is blending.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendDirection {
    /// Blending in, or fully in.
    In,
    /// Blending out after a deactivation.
    Out,
}

/// Blend weight bookkeeping of one instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendState {
    transition: TransitionSpec,
    direction: BlendDirection,
    elapsed_secs: f64,
    from_weight: f64,
    weight: f64,
}

impl BlendState {
    pub(crate) fn blend_in(transition: TransitionSpec) -> Self {
        Self {
            transition,
            direction: BlendDirection::In,
            elapsed_secs: 0.0,
            from_weight: 0.0,
            weight: transition.weight_at(0.0),
        }
    }

    pub(crate) fn start_blend_out(&mut self, transition: TransitionSpec) {
        self.from_weight = self.weight;
        self.transition = transition;
        self.direction = BlendDirection::Out;
        self.elapsed_secs = 0.0;
        self.weight = self.from_weight * (1.0 - transition.weight_at(0.0));
    }

    pub(crate) fn advance(&mut self, delta_time: f64) {
        self.elapsed_secs += delta_time.max(0.0);
        let t = self.transition.weight_at(self.elapsed_secs);
        self.weight = match self.direction {
            BlendDirection::In => t,
            BlendDirection::Out => self.from_weight * (1.0 - t),
        };
    }

    /// Current weight in `[0, 1]`.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Blend direction.
    pub fn direction(&self) -> BlendDirection {
        self.direction
    }

    /// Fully blended in.
    pub fn is_full(&self) -> bool {
        self.direction == BlendDirection::In && self.weight >= 1.0
    }

    /// Blended out completely.
    pub fn is_finished(&self) -> bool {
        self.direction == BlendDirection::Out && self.weight <= 0.0
    }
}

/// One running rig.
#[derive(Debug)]
pub struct RigInstance {
    pub(crate) id: RigInstanceId,
    pub(crate) context: ContextHandle,
    pub(crate) rig: Arc<CameraRigAsset>,
    pub(crate) layer: Layer,
    pub(crate) order_key: i32,
    pub(crate) evaluators: NodeEvaluatorTree,
    pub(crate) result: EvaluationResult,
    pub(crate) blend: BlendState,
    pub(crate) first_frame: bool,
    pub(crate) pending_cut: bool,
}

impl RigInstance {
    /// Instance id.
    pub fn id(&self) -> RigInstanceId {
        self.id
    }

    /// Activating context.
    pub fn context(&self) -> ContextHandle {
        self.context
    }

    /// Source rig.
    pub fn rig(&self) -> &Arc<CameraRigAsset> {
        &self.rig
    }

    /// Layer the instance runs on.
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Result of the last evaluation.
    pub fn result(&self) -> &EvaluationResult {
        &self.result
    }

    /// Blend state.
    pub fn blend(&self) -> &BlendState {
        &self.blend
    }

    pub(crate) fn is_blending_out(&self) -> bool {
        self.blend.direction == BlendDirection::Out
    }

    pub(crate) fn matches(&self, context: ContextHandle, rig: &CameraRigAsset) -> bool {
        self.context == context && self.rig.id() == rig.id()
    }
}

/// Snapshot of an instance for callers outside the root evaluator.
#[derive(Clone, Debug)]
pub struct CameraRigInfo {
    /// Instance id.
    pub instance: RigInstanceId,
    /// Activating context.
    pub context: ContextHandle,
    /// Source rig.
    pub rig: Arc<CameraRigAsset>,
    /// Layer.
    pub layer: Layer,
    /// Blend weight.
    pub weight: f64,
    /// Blending out after a deactivation.
    pub blending_out: bool,
}

impl From<&RigInstance> for CameraRigInfo {
    fn from(inst: &RigInstance) -> Self {
        Self {
            instance: inst.id,
            context: inst.context,
            rig: Arc::clone(&inst.rig),
            layer: inst.layer,
            weight: inst.blend.weight,
            blending_out: inst.is_blending_out(),
        }
    }
}
