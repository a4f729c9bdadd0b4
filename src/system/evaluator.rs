use std::any::Any;
use std::sync::Arc;

use crate::context::arena::{ContextArena, ContextHandle};
use crate::context::context::{ContextOwnerInfo, EvaluationContext};
use crate::context::stack::{ContextStack, ContextStackEvent};
use crate::director::director::DirectorRunContext;
use crate::director::registry::DirectorRegistry;
use crate::director::request::DirectorEvaluationResult;
use crate::foundation::error::CamRigResult;
use crate::result::evaluation_result::EvaluationResult;
use crate::rig::asset::CameraAsset;
use crate::rig::combined::CombinedRigCache;
use crate::root::evaluator::RootEvaluator;
use crate::system::arbitration::arbitrate;
use crate::system::opts::CameraSystemOpts;
use crate::system::service::{EvaluationService, ServiceUpdateParams};

/// Owns every context, the context stack and the root evaluator, and runs one camera
/// frame per [`SystemEvaluator::update`].
#[derive(Debug)]
pub struct SystemEvaluator {
    opts: CameraSystemOpts,
    registry: DirectorRegistry,
    arena: ContextArena,
    stack: ContextStack,
    root: RootEvaluator,
    combined_rigs: CombinedRigCache,
    services: Vec<Box<dyn EvaluationService>>,
    active_context: Option<ContextHandle>,
    frame: u64,
}

impl Default for SystemEvaluator {
    fn default() -> Self {
        Self::new(CameraSystemOpts::default(), DirectorRegistry::with_builtins())
    }
}

impl Drop for SystemEvaluator {
    fn drop(&mut self) {
        for svc in &mut self.services {
            svc.teardown();
        }
    }
}

impl SystemEvaluator {
    /// Empty system building directors from `registry`.
    pub fn new(opts: CameraSystemOpts, registry: DirectorRegistry) -> Self {
        Self {
            root: RootEvaluator::new(opts.default_transition),
            opts,
            registry,
            arena: ContextArena::new(),
            stack: ContextStack::new(),
            combined_rigs: CombinedRigCache::new(),
            services: Vec::new(),
            active_context: None,
            frame: 0,
        }
    }

    /// Options the system was built with.
    pub fn opts(&self) -> &CameraSystemOpts {
        &self.opts
    }

    /// Director factories.
    pub fn registry(&self) -> &DirectorRegistry {
        &self.registry
    }

    /// Every live context.
    pub fn arena(&self) -> &ContextArena {
        &self.arena
    }

    /// Context stack.
    pub fn context_stack(&self) -> &ContextStack {
        &self.stack
    }

    /// Root evaluator.
    pub fn root_evaluator(&self) -> &RootEvaluator {
        &self.root
    }

    /// Mutable root evaluator, for direct rig requests.
    pub fn root_evaluator_mut(&mut self) -> &mut RootEvaluator {
        &mut self.root
    }

    pub(crate) fn solver_parts(
        &mut self,
    ) -> (&ContextArena, &mut RootEvaluator, Option<ContextHandle>) {
        let active = self.stack.active_context(&self.arena);
        (&self.arena, &mut self.root, active)
    }

    /// Frames evaluated so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Context `handle`, while alive.
    pub fn context(&self, handle: ContextHandle) -> Option<&EvaluationContext> {
        self.arena.get(handle)
    }

    /// Mutable context `handle`, while alive. Hosts write initial and conditional results
    /// through this.
    pub fn context_mut(&mut self, handle: ContextHandle) -> Option<&mut EvaluationContext> {
        self.arena.get_mut(handle)
    }

    /// Create and initialize a context.
    pub fn create_context(
        &mut self,
        name: impl Into<String>,
        asset: Option<Arc<CameraAsset>>,
        owner_info: ContextOwnerInfo,
    ) -> CamRigResult<ContextHandle> {
        let handle = self.arena.insert(EvaluationContext::new(name, asset));
        self.arena.require_mut(handle)?.initialize(owner_info)?;
        Ok(handle)
    }

    /// Destroy `handle` and its children, stopping their rigs.
    pub fn destroy_context(&mut self, handle: ContextHandle) -> usize {
        let destroyed = self.arena.destroy(handle);
        for h in &destroyed {
            self.root
                .deactivate_all_camera_rigs(*h, self.opts.immediate_deactivate_on_remove);
        }
        self.stack.prune(&self.arena);
        self.sync_active_context();
        destroyed.len()
    }

    /// Context on top of the stack.
    pub fn active_context(&self) -> Option<ContextHandle> {
        self.stack.active_context(&self.arena)
    }

    /// Push `handle` on the stack, moving it to the top when already present.
    pub fn push_context(&mut self, handle: ContextHandle) -> CamRigResult<()> {
        self.arena.require(handle)?;
        self.stack.push_context(handle);
        self.sync_active_context();
        Ok(())
    }

    /// Pop the top context and stop its rigs.
    pub fn pop_context(&mut self) -> Option<ContextHandle> {
        let popped = self.stack.pop_context()?;
        self.on_context_left(popped);
        self.sync_active_context();
        Some(popped)
    }

    /// Remove `handle` from the stack and stop its rigs. Returns `false` when absent.
    pub fn remove_context(&mut self, handle: ContextHandle) -> bool {
        if !self.stack.remove_context(handle) {
            return false;
        }
        self.on_context_left(handle);
        self.sync_active_context();
        true
    }

    /// Clear the stack, stopping the rigs of every entry.
    pub fn reset_context_stack(&mut self) {
        let entries = self.stack.entries().to_vec();
        self.stack.reset();
        for h in entries {
            self.on_context_left(h);
        }
        self.sync_active_context();
    }

    /// Register `child` under `parent`, or under the active context.
    pub fn add_child_context(
        &mut self,
        child: ContextHandle,
        parent: Option<ContextHandle>,
    ) -> CamRigResult<ContextHandle> {
        self.stack.add_child_context(&mut self.arena, child, parent)
    }

    /// Detach `child` from `parent`, stopping the child's rigs.
    pub fn remove_child_context(&mut self, parent: ContextHandle, child: ContextHandle) -> bool {
        if !self.arena.unregister_child_context(parent, child) {
            return false;
        }
        self.on_context_left(child);
        true
    }

    /// Pending stack change events, oldest first.
    ///
    /// Events still pending at the end of an update are handed to the services and
    /// dropped.
    pub fn drain_stack_events(&mut self) -> Vec<ContextStackEvent> {
        self.stack.drain_events()
    }

    fn on_context_left(&mut self, handle: ContextHandle) {
        let n = self
            .root
            .deactivate_all_camera_rigs(handle, self.opts.immediate_deactivate_on_remove);
        if n > 0 {
            tracing::debug!(?handle, rigs = n, "context left the stack");
        }
    }

    /// Deactivate the previous top context and activate the new one when the top changed.
    fn sync_active_context(&mut self) {
        let now = self.stack.active_context(&self.arena);
        if now == self.active_context {
            return;
        }
        if let Some(ctx) = self.active_context.and_then(|h| self.arena.get_mut(h)) {
            if ctx.is_active() {
                if let Err(err) = ctx.deactivate() {
                    tracing::warn!(%err, "deactivating previous context");
                }
            }
        }
        if let Some(ctx) = now.and_then(|h| self.arena.get_mut(h)) {
            if !ctx.is_active() {
                if let Err(err) = ctx.activate(&self.registry) {
                    tracing::warn!(%err, "activating context");
                }
            }
        }
        self.active_context = now;
    }

    /// Add a service. Its hooks run from the next update on.
    pub fn register_service(&mut self, service: Box<dyn EvaluationService>) {
        self.services.push(service);
    }

    /// First registered service of type `T`.
    pub fn find_service<T: EvaluationService>(&self) -> Option<&T> {
        self.services.iter().find_map(|s| {
            let any: &dyn Any = &**s;
            any.downcast_ref::<T>()
        })
    }

    /// First registered service of type `T`, mutably.
    pub fn find_service_mut<T: EvaluationService>(&mut self) -> Option<&mut T> {
        self.services.iter_mut().find_map(|s| {
            let any: &mut dyn Any = &mut **s;
            any.downcast_mut::<T>()
        })
    }

    /// Tear down and drop every service of type `T`. Returns how many were removed.
    pub fn remove_service<T: EvaluationService>(&mut self) -> usize {
        let before = self.services.len();
        self.services.retain_mut(|s| {
            let any: &dyn Any = &**s;
            if any.is::<T>() {
                s.teardown();
                false
            } else {
                true
            }
        });
        before - self.services.len()
    }

    /// Aggregate result of the last update.
    pub fn result(&self) -> &EvaluationResult {
        self.root.result()
    }

    /// Aggregate result of the last update before the Visual layer.
    pub fn pre_visual_result(&self) -> &EvaluationResult {
        self.root.pre_visual_result()
    }

    /// Evaluate one frame.
    ///
    /// Nothing in here fails the frame: bad requests are logged and skipped, and without
    /// an active context the last result is held.
    #[tracing::instrument(skip_all, fields(frame = self.frame, dt = delta_time))]
    pub fn update(&mut self, delta_time: f64) -> &EvaluationResult {
        self.sync_active_context();
        let active = self.active_context;
        let params = ServiceUpdateParams {
            delta_time,
            active_context: active,
        };
        for svc in &mut self.services {
            svc.on_pre_update(&params);
        }

        if let Some(handle) = active {
            let out = self.run_director(handle, delta_time);
            for released in out.released_contexts {
                self.on_context_left(released);
            }
            for request in arbitrate(&self.arena, &mut self.combined_rigs, out.requests) {
                if let Err(err) = self.root.execute_director_request(&mut self.arena, &request) {
                    tracing::warn!(rig = request.rig.name(), %err, "skipping rig request");
                }
            }
        }

        self.root.run(&self.arena, active, delta_time);

        let events = self.root.drain_events();
        let stack_events = self.stack.drain_events();
        for svc in &mut self.services {
            for event in &stack_events {
                svc.on_context_stack_event(event);
            }
            for event in &events {
                svc.on_rig_event(event);
            }
            svc.on_post_update(&params, self.root.result_mut());
        }

        self.stack.prune(&self.arena);
        self.arena.on_end_of_frame_all();
        self.frame += 1;
        self.root.result()
    }

    fn run_director(
        &mut self,
        handle: ContextHandle,
        delta_time: f64,
    ) -> DirectorEvaluationResult {
        let Some(mut director) = self.arena.get_mut(handle).and_then(|c| c.take_director()) else {
            return DirectorEvaluationResult::default();
        };
        let mut out = DirectorEvaluationResult::default();
        let res = {
            let mut run =
                DirectorRunContext::new(&mut self.arena, &self.registry, handle, delta_time);
            director.run(&mut run, &mut out)
        };
        if let Some(ctx) = self.arena.get_mut(handle) {
            ctx.restore_director(director);
        }
        if let Err(err) = res {
            tracing::warn!(%err, "director run failed");
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/system/evaluator.rs"]
mod tests;
