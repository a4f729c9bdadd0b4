use std::sync::Arc;

use crate::context::arena::{ContextArena, ContextHandle};
use crate::context::context::{EvaluationContext, ResultCondition};
use crate::director::request::{CameraRigRequest, Layer, RequestKind};
use crate::foundation::error::{CamRigError, CamRigResult};
use crate::foundation::ids::{RigId, RigInstanceId};
use crate::result::allocation::AllocationInfo;
use crate::result::evaluation_result::EvaluationResult;
use crate::result::table::SlotFilter;
use crate::rig::archive::{StateReader, StateWriter};
use crate::rig::node::{NodeEvaluationParams, NodeInitializeParams, NodeOperationParams};
use crate::rig::operation::CameraOperation;
use crate::rig::transition::TransitionSpec;
use crate::root::blend_stack::{BlendStack, BlendStackKind};
use crate::root::instance::{BlendState, CameraRigInfo, RigInstance};

/// Rig lifecycle notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RigEventKind {
    /// Instance created.
    Activated,
    /// Instance started blending out.
    Deactivated,
    /// Instance destroyed.
    Removed,
}

/// Rig lifecycle event forwarded to evaluation services.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RigEvent {
    /// What happened.
    pub kind: RigEventKind,
    /// Instance concerned.
    pub instance: RigInstanceId,
    /// Its rig.
    pub rig: RigId,
    /// Its context.
    pub context: ContextHandle,
    /// Its layer.
    pub layer: Layer,
}

impl RigEvent {
    fn new(kind: RigEventKind, inst: &RigInstance) -> Self {
        Self {
            kind,
            instance: inst.id,
            rig: inst.rig.id(),
            context: inst.context,
            layer: inst.layer,
        }
    }
}

/// Instances that make up an isolated evaluation of one rig, in evaluation order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleRigHierarchy {
    instance: RigInstanceId,
    entries: Vec<(Layer, RigInstanceId)>,
}

impl SingleRigHierarchy {
    /// Instance the hierarchy was built for.
    pub fn instance(&self) -> RigInstanceId {
        self.instance
    }

    /// `(layer, instance)` pairs in evaluation order.
    pub fn entries(&self) -> &[(Layer, RigInstanceId)] {
        &self.entries
    }

    /// Return `true` when `id` is part of the hierarchy.
    pub fn contains(&self, id: RigInstanceId) -> bool {
        self.entries.iter().any(|(_, e)| *e == id)
    }
}

#[derive(Clone, Copy)]
struct EvaluationInputs {
    active_context: Option<ContextHandle>,
    is_top_main: bool,
    delta_time: f64,
    is_isolated: bool,
}

fn evaluate_instance(
    inst: &mut RigInstance,
    ctx: &EvaluationContext,
    acc: &EvaluationResult,
    scratch: &mut EvaluationResult,
    inputs: EvaluationInputs,
) {
    scratch.reset();
    scratch.pose = match inst.layer {
        Layer::Base | Layer::Main => ctx.initial_result().pose.clone(),
        Layer::Global | Layer::Visual => acc.pose.clone(),
    };
    scratch.post_process = acc.post_process;
    scratch
        .variable_table
        .override_from(&acc.variable_table, SlotFilter::Public);
    scratch.data_table.override_from(&acc.data_table, SlotFilter::All);
    scratch
        .variable_table
        .override_from(&inst.result.variable_table, SlotFilter::Private);

    let initial = ctx.initial_result();
    scratch
        .variable_table
        .override_from(&initial.variable_table, SlotFilter::All);
    scratch
        .data_table
        .override_from(&initial.data_table, SlotFilter::All);
    if inputs.active_context == Some(inst.context) {
        if let Some(overlay) = ctx.conditional_result(ResultCondition::ActiveContext) {
            scratch.override_changed(overlay);
        }
    }
    if inputs.is_top_main {
        if let Some(overlay) = ctx.conditional_result(ResultCondition::ActiveCameraRig) {
            scratch.override_changed(overlay);
        }
    }

    let params = NodeEvaluationParams {
        context: inst.context,
        delta_time: inputs.delta_time,
        is_first_frame: inst.first_frame,
        is_isolated: inputs.is_isolated,
    };
    inst.evaluators.run(&params, scratch);
    scratch.is_valid = true;

    if !inputs.is_isolated {
        if inst.pending_cut {
            scratch.is_camera_cut = true;
            inst.pending_cut = false;
        }
        inst.first_frame = false;
    }
}

/// Runs every active rig instance on the Base, Main, Global and Visual layers and
/// blends their results.
#[derive(Debug)]
pub struct RootEvaluator {
    stacks: [BlendStack; 4],
    next_instance: u32,
    default_transition: TransitionSpec,
    result: EvaluationResult,
    pre_visual: EvaluationResult,
    blended_parameters: EvaluationResult,
    scratch: EvaluationResult,
    events: Vec<RigEvent>,
}

impl Default for RootEvaluator {
    fn default() -> Self {
        Self::new(TransitionSpec::default())
    }
}

impl RootEvaluator {
    /// Empty evaluator using `default_transition` for rigs without their own.
    pub fn new(default_transition: TransitionSpec) -> Self {
        Self {
            stacks: [
                BlendStack::new(BlendStackKind::Persistent),
                BlendStack::new(BlendStackKind::Transient),
                BlendStack::new(BlendStackKind::Persistent),
                BlendStack::new(BlendStackKind::Persistent),
            ],
            next_instance: 1,
            default_transition,
            result: EvaluationResult::default(),
            pre_visual: EvaluationResult::default(),
            blended_parameters: EvaluationResult::default(),
            scratch: EvaluationResult::default(),
            events: Vec::new(),
        }
    }

    /// Transition used when neither the request nor the rig provides one.
    pub fn default_transition(&self) -> TransitionSpec {
        self.default_transition
    }

    /// Blend stack of `layer`.
    pub fn stack(&self, layer: Layer) -> &BlendStack {
        &self.stacks[layer as usize]
    }

    /// Aggregate result of the last evaluated frame.
    pub fn result(&self) -> &EvaluationResult {
        &self.result
    }

    /// Aggregate result before the Visual layer.
    pub fn pre_visual_result(&self) -> &EvaluationResult {
        &self.pre_visual
    }

    /// Aggregate result right after the Main layer.
    pub fn blended_parameters(&self) -> &EvaluationResult {
        &self.blended_parameters
    }

    pub(crate) fn result_mut(&mut self) -> &mut EvaluationResult {
        &mut self.result
    }

    /// Pending rig events, oldest first.
    pub fn drain_events(&mut self) -> Vec<RigEvent> {
        std::mem::take(&mut self.events)
    }

    fn allocate(&mut self, info: &AllocationInfo) {
        self.result.allocate(info);
        self.pre_visual.allocate(info);
        self.blended_parameters.allocate(info);
        self.scratch.allocate(info);
    }

    fn next_id(&mut self) -> RigInstanceId {
        let id = RigInstanceId(self.next_instance);
        self.next_instance = self.next_instance.wrapping_add(1).max(1);
        id
    }

    /// Start running `request.rig` for `request.context`.
    ///
    /// Re-activating a rig that is already running for the same context (on top, for
    /// the Main layer) is a no-op unless the request is forced.
    #[tracing::instrument(skip_all, fields(rig = request.rig.name(), layer = ?request.layer))]
    pub fn activate_camera_rig(
        &mut self,
        arena: &mut ContextArena,
        request: &CameraRigRequest,
    ) -> CamRigResult<RigInstanceId> {
        if request.kind != RequestKind::Activate {
            return Err(CamRigError::protocol("activate_camera_rig given a deactivation"));
        }
        let rig = &request.rig;
        arena
            .require_mut(request.context)?
            .allocate(&rig.allocation_info);
        self.allocate(&rig.allocation_info);

        let layer = request.layer;
        let stack = &self.stacks[layer as usize];
        let existing = match stack.kind() {
            BlendStackKind::Transient => stack
                .top()
                .filter(|t| t.matches(request.context, rig) && !t.is_blending_out()),
            BlendStackKind::Persistent => stack
                .entries()
                .iter()
                .find(|e| e.matches(request.context, rig) && !e.is_blending_out()),
        }
        .map(|e| e.id);

        let transition = request
            .transition_override
            .or(rig.enter_transition)
            .unwrap_or(self.default_transition);

        if let Some(existing) = existing {
            if !request.force {
                return Ok(existing);
            }
            if stack.kind() == BlendStackKind::Persistent {
                self.blend_out_instance(layer, existing, transition);
            }
        }

        let id = self.next_id();
        let mut result = self.result.clone();
        result.reset();
        let mut evaluators = rig.build_evaluator_tree();
        evaluators.initialize(
            &NodeInitializeParams {
                context: request.context,
                instance: id,
            },
            &mut result,
        );
        let instance = RigInstance {
            id,
            context: request.context,
            rig: Arc::clone(rig),
            layer,
            order_key: request.order_key,
            evaluators,
            result,
            blend: BlendState::blend_in(transition),
            first_frame: true,
            pending_cut: transition.is_cut(),
        };
        self.events
            .push(RigEvent::new(RigEventKind::Activated, &instance));
        self.stacks[layer as usize].insert(instance);
        tracing::debug!(instance = id.0, cut = transition.is_cut(), "rig activated");
        Ok(id)
    }

    fn blend_out_instance(
        &mut self,
        layer: Layer,
        id: RigInstanceId,
        transition: TransitionSpec,
    ) {
        let stack = &mut self.stacks[layer as usize];
        if transition.is_cut() {
            if let Some(inst) = stack.remove(id) {
                self.events.push(RigEvent::new(RigEventKind::Deactivated, &inst));
                self.events.push(RigEvent::new(RigEventKind::Removed, &inst));
            }
        } else if let Some(inst) = stack.find_mut(id) {
            inst.blend.start_blend_out(transition);
            self.events.push(RigEvent::new(RigEventKind::Deactivated, inst));
        }
    }

    /// Stop running `request.rig` for `request.context`. Returns `false` when it was not
    /// running.
    #[tracing::instrument(skip_all, fields(rig = request.rig.name(), layer = ?request.layer))]
    pub fn deactivate_camera_rig(&mut self, request: &CameraRigRequest) -> CamRigResult<bool> {
        if request.kind != RequestKind::Deactivate {
            return Err(CamRigError::protocol("deactivate_camera_rig given an activation"));
        }
        let transition = request
            .transition_override
            .or(request.rig.exit_transition)
            .unwrap_or(self.default_transition);
        let targets: Vec<RigInstanceId> = self.stacks[request.layer as usize]
            .entries()
            .iter()
            .filter(|e| e.matches(request.context, &request.rig) && !e.is_blending_out())
            .map(|e| e.id)
            .collect();
        if targets.is_empty() {
            tracing::debug!("rig not running; nothing to deactivate");
            return Ok(false);
        }
        for id in targets {
            self.blend_out_instance(request.layer, id, transition);
        }
        Ok(true)
    }

    /// Stop every rig of `context` on every layer. Returns how many instances were hit.
    pub fn deactivate_all_camera_rigs(
        &mut self,
        context: ContextHandle,
        immediate: bool,
    ) -> usize {
        let mut count = 0;
        for layer in Layer::ALL {
            let targets: Vec<(RigInstanceId, TransitionSpec)> = self.stacks[layer as usize]
                .entries()
                .iter()
                .filter(|e| e.context == context && (immediate || !e.is_blending_out()))
                .map(|e| {
                    let t = if immediate {
                        TransitionSpec::cut()
                    } else {
                        e.rig.exit_transition.unwrap_or(self.default_transition)
                    };
                    (e.id, t)
                })
                .collect();
            count += targets.len();
            for (id, transition) in targets {
                self.blend_out_instance(layer, id, transition);
            }
        }
        count
    }

    /// Execute one resolved director request.
    pub fn execute_director_request(
        &mut self,
        arena: &mut ContextArena,
        request: &CameraRigRequest,
    ) -> CamRigResult<()> {
        match request.kind {
            RequestKind::Activate => self.activate_camera_rig(arena, request).map(|_| ()),
            RequestKind::Deactivate => self.deactivate_camera_rig(request).map(|_| ()),
        }
    }

    /// Top instance of the Main layer.
    pub fn active_camera_rig_info(&self) -> Option<CameraRigInfo> {
        self.stack(Layer::Main).top().map(CameraRigInfo::from)
    }

    fn find_instance(&self, id: RigInstanceId) -> Option<&RigInstance> {
        self.stacks.iter().find_map(|s| s.find(id))
    }

    /// Running instance `id`, on any layer.
    pub fn instance(&self, id: RigInstanceId) -> Option<&RigInstance> {
        self.find_instance(id)
    }

    /// Info about any running instance.
    pub fn camera_rig_info(&self, id: RigInstanceId) -> Option<CameraRigInfo> {
        self.find_instance(id).map(CameraRigInfo::from)
    }

    /// Return `true` when some instance on any layer is not blending out.
    pub fn has_any_active_camera_rig(&self) -> bool {
        self.stacks
            .iter()
            .flat_map(|s| s.entries())
            .any(|e| !e.is_blending_out())
    }

    /// Return `true` when `context` owns any instance, blending out included.
    pub fn has_any_running_camera_rig(&self, context: ContextHandle) -> bool {
        self.stacks
            .iter()
            .flat_map(|s| s.entries())
            .any(|e| e.context == context)
    }

    /// Evaluate one frame.
    ///
    /// Without an active context nothing is evaluated and the previous result is kept
    /// as is.
    pub fn run(
        &mut self,
        arena: &ContextArena,
        active_context: Option<ContextHandle>,
        delta_time: f64,
    ) {
        if active_context.is_none() {
            tracing::trace!("no active context; holding last result");
            return;
        }
        let Self {
            stacks,
            result,
            pre_visual,
            blended_parameters,
            scratch,
            events,
            ..
        } = self;

        result.reset_frame_flags();
        result.auto_reset();
        result.joints.reset();
        result.post_process.reset();
        result.is_valid = false;
        if let Some(ctx) = active_context.and_then(|h| arena.get(h)) {
            result.pose = ctx.initial_result().pose.clone();
        }
        for layer in Layer::ALL {
            if layer == Layer::Visual {
                pre_visual.clone_from(result);
            }
            let stack = &mut stacks[layer as usize];
            stack.advance(delta_time);
            let top_main = match layer {
                Layer::Main => stack.top().map(|t| t.id),
                _ => None,
            };
            for i in 0..stack.entries().len() {
                let weight = stack.effective_weight(i);
                let inst = &mut stack.entries_mut()[i];
                let Some(ctx) = arena.get(inst.context) else {
                    continue;
                };
                let inputs = EvaluationInputs {
                    active_context,
                    is_top_main: top_main == Some(inst.id),
                    delta_time,
                    is_isolated: false,
                };
                evaluate_instance(inst, ctx, result, scratch, inputs);
                inst.result.clone_from(scratch);
                inst.result.auto_reset();
                result.lerp_from(scratch, weight);
            }
            for removed in stack.collect_finished() {
                events.push(RigEvent::new(RigEventKind::Removed, &removed));
            }
            if layer == Layer::Main {
                blended_parameters.clone_from(result);
            }
        }
    }

    /// Instances needed to evaluate `instance` on its own: Base and Global instances,
    /// with the Main layer narrowed to `instance` (or its top when `instance` is on
    /// another layer). Visual instances are left out unless `instance` is one.
    pub fn build_single_camera_rig_hierarchy(
        &self,
        instance: RigInstanceId,
    ) -> CamRigResult<SingleRigHierarchy> {
        let target = self.find_instance(instance).ok_or_else(|| {
            CamRigError::evaluation(format!("rig instance {} is not running", instance.0))
        })?;
        let mut entries = Vec::new();
        for layer in [Layer::Base, Layer::Main, Layer::Global] {
            let stack = self.stack(layer);
            match layer {
                Layer::Main if target.layer == Layer::Main => entries.push((layer, instance)),
                Layer::Main => entries.extend(stack.top().map(|t| (layer, t.id))),
                _ => entries.extend(
                    stack
                        .entries()
                        .iter()
                        .filter(|e| !e.is_blending_out() || e.id == instance)
                        .map(|e| (layer, e.id)),
                ),
            }
        }
        if target.layer == Layer::Visual {
            entries.push((Layer::Visual, instance));
        }
        Ok(SingleRigHierarchy { instance, entries })
    }

    /// Evaluate `hierarchy` into `out`, each instance at full weight, after reverting
    /// the auto-reset slots of `out`.
    ///
    /// Node state advances; callers snapshot and restore around this. Instance results
    /// are left untouched.
    pub fn run_single_camera_rig(
        &mut self,
        arena: &ContextArena,
        hierarchy: &SingleRigHierarchy,
        active_context: Option<ContextHandle>,
        delta_time: f64,
        out: &mut EvaluationResult,
    ) -> CamRigResult<()> {
        let Self { stacks, scratch, .. } = self;
        out.auto_reset();
        for (layer, id) in &hierarchy.entries {
            let inst = stacks[*layer as usize].find_mut(*id).ok_or_else(|| {
                CamRigError::evaluation(format!("rig instance {} is gone", id.0))
            })?;
            let Some(ctx) = arena.get(inst.context) else {
                continue;
            };
            let inputs = EvaluationInputs {
                active_context,
                is_top_main: *layer == Layer::Main,
                delta_time,
                is_isolated: true,
            };
            evaluate_instance(inst, ctx, out, scratch, inputs);
            out.lerp_from(scratch, 1.0);
        }
        Ok(())
    }

    /// Serialize the evaluator state of every instance of `hierarchy`.
    pub fn snapshot_hierarchy(&self, hierarchy: &SingleRigHierarchy) -> CamRigResult<Vec<u8>> {
        let mut w = StateWriter::new();
        for (layer, id) in &hierarchy.entries {
            let inst = self.stack(*layer).find(*id).ok_or_else(|| {
                CamRigError::evaluation(format!("rig instance {} is gone", id.0))
            })?;
            inst.evaluators.serialize_state(&mut w)?;
        }
        Ok(w.into_bytes())
    }

    /// Restore what [`RootEvaluator::snapshot_hierarchy`] wrote.
    pub fn restore_hierarchy(
        &mut self,
        hierarchy: &SingleRigHierarchy,
        bytes: &[u8],
    ) -> CamRigResult<()> {
        let mut r = StateReader::new(bytes);
        for (layer, id) in &hierarchy.entries {
            let inst = self.stacks[*layer as usize].find_mut(*id).ok_or_else(|| {
                CamRigError::evaluation(format!("rig instance {} is gone", id.0))
            })?;
            inst.evaluators.deserialize_state(&mut r)?;
        }
        r.finish()
    }

    /// Offer `op` to every instance of `hierarchy`, in evaluation order.
    pub fn broadcast_operation(
        &mut self,
        hierarchy: &SingleRigHierarchy,
        op: &mut CameraOperation,
    ) {
        for (layer, id) in &hierarchy.entries {
            if let Some(inst) = self.stacks[*layer as usize].find_mut(*id) {
                let params = NodeOperationParams {
                    context: inst.context,
                };
                inst.evaluators.execute_operation(&params, op);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/root/evaluator.rs"]
mod tests;
