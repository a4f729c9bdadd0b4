use std::any::Any;
use std::fmt;

use crate::context::arena::ContextHandle;
use crate::context::stack::ContextStackEvent;
use crate::result::evaluation_result::EvaluationResult;
use crate::root::evaluator::RigEvent;

/// Frame information handed to service hooks.
#[derive(Clone, Copy, Debug)]
pub struct ServiceUpdateParams {
    /// Frame delta time in seconds.
    pub delta_time: f64,
    /// Active context at the time of the hook.
    pub active_context: Option<ContextHandle>,
}

/// Cross-cutting hook run around every frame update.
///
/// Pre-update hooks run before the director, post-update hooks after the root evaluator
/// and before end-of-frame housekeeping.
pub trait EvaluationService: Any + fmt::Debug {
    /// Called before the director runs.
    fn on_pre_update(&mut self, _params: &ServiceUpdateParams) {}

    /// Called with the aggregate result once the frame is evaluated.
    fn on_post_update(&mut self, _params: &ServiceUpdateParams, _result: &mut EvaluationResult) {}

    /// Called for every rig activation, deactivation and removal.
    fn on_rig_event(&mut self, _event: &RigEvent) {}

    /// Called for every context stack change the host did not drain before the update.
    fn on_context_stack_event(&mut self, _event: &ContextStackEvent) {}

    /// Called once when the service is removed or the system is dropped.
    fn teardown(&mut self) {}
}
