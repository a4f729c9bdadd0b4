use std::fmt;

use crate::context::arena::{ContextArena, ContextHandle};
use crate::director::registry::DirectorRegistry;
use crate::director::request::{DirectorEvaluationResult, RequestKind};
use crate::foundation::error::{CamRigError, CamRigResult};
use crate::rig::transition::TransitionSpec;

/// Parameters of director lifecycle callbacks.
#[derive(Clone, Copy, Debug)]
pub struct DirectorLifecycleParams {
    /// Owning context.
    pub context: ContextHandle,
}

/// Decides which rigs a context wants running.
pub trait Director: fmt::Debug {
    /// Called once after construction.
    fn initialize(&mut self, _params: &DirectorLifecycleParams) {}

    /// Called when the owning context becomes active.
    fn activate(&mut self, _params: &DirectorLifecycleParams) {}

    /// Called when the owning context stops being active.
    fn deactivate(&mut self, _params: &DirectorLifecycleParams) {}

    /// Emit this frame's requests into `out`.
    fn run(&mut self, run: &mut DirectorRunContext<'_>, out: &mut DirectorEvaluationResult);
}

/// Director lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectorState {
    /// Built, `initialize` not called yet.
    Uninitialized,
    /// Initialized, never activated.
    Initialized,
    /// Running.
    Activated,
    /// Stopped; may be activated again.
    Deactivated,
}

/// A director plus its lifecycle state.
#[derive(Debug)]
pub struct DirectorInstance {
    director: Box<dyn Director>,
    state: DirectorState,
    next_activation_transition: Option<TransitionSpec>,
}

impl DirectorInstance {
    /// Wrap a freshly built director.
    pub fn new(director: Box<dyn Director>) -> Self {
        Self {
            director,
            state: DirectorState::Uninitialized,
            next_activation_transition: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DirectorState {
        self.state
    }

    fn transition(&mut self, allowed: &[DirectorState], to: DirectorState) -> CamRigResult<()> {
        if !allowed.contains(&self.state) {
            return Err(CamRigError::protocol(format!(
                "director cannot go from {:?} to {to:?}",
                self.state
            )));
        }
        self.state = to;
        Ok(())
    }

    /// Uninitialized -> Initialized.
    pub fn initialize(&mut self, params: &DirectorLifecycleParams) -> CamRigResult<()> {
        self.transition(&[DirectorState::Uninitialized], DirectorState::Initialized)?;
        self.director.initialize(params);
        Ok(())
    }

    /// Initialized | Deactivated -> Activated.
    pub fn activate(&mut self, params: &DirectorLifecycleParams) -> CamRigResult<()> {
        self.transition(
            &[DirectorState::Initialized, DirectorState::Deactivated],
            DirectorState::Activated,
        )?;
        self.director.activate(params);
        Ok(())
    }

    /// Activated -> Deactivated.
    pub fn deactivate(&mut self, params: &DirectorLifecycleParams) -> CamRigResult<()> {
        self.transition(&[DirectorState::Activated], DirectorState::Deactivated)?;
        self.director.deactivate(params);
        Ok(())
    }

    /// Use `transition` for the next activation this director emits, once.
    pub fn override_next_activation_transition(&mut self, transition: TransitionSpec) {
        self.next_activation_transition = Some(transition);
    }

    /// Pending one-shot transition override.
    pub fn next_activation_transition(&self) -> Option<TransitionSpec> {
        self.next_activation_transition
    }

    /// Run the director. Only valid while activated.
    pub fn run(
        &mut self,
        run: &mut DirectorRunContext<'_>,
        out: &mut DirectorEvaluationResult,
    ) -> CamRigResult<()> {
        if self.state != DirectorState::Activated {
            return Err(CamRigError::protocol(format!(
                "director run while {:?}",
                self.state
            )));
        }
        let first = out.requests.len();
        self.director.run(run, out);

        if let Some(transition) = self.next_activation_transition {
            let mut used = false;
            for request in &mut out.requests[first..] {
                if request.kind == RequestKind::Activate {
                    request.transition_override = Some(transition);
                    used = true;
                }
            }
            if used {
                self.next_activation_transition = None;
            }
        }
        Ok(())
    }
}

/// What a director sees while running.
pub struct DirectorRunContext<'a> {
    arena: &'a mut ContextArena,
    registry: &'a DirectorRegistry,
    context: ContextHandle,
    delta_time: f64,
}

impl<'a> DirectorRunContext<'a> {
    pub(crate) fn new(
        arena: &'a mut ContextArena,
        registry: &'a DirectorRegistry,
        context: ContextHandle,
        delta_time: f64,
    ) -> Self {
        Self {
            arena,
            registry,
            context,
            delta_time,
        }
    }

    /// Context owning the running director.
    pub fn context(&self) -> ContextHandle {
        self.context
    }

    /// Frame delta time in seconds.
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Every context, read-only.
    pub fn arena(&self) -> &ContextArena {
        self.arena
    }

    /// Run the director of `child`, activating the child first if needed.
    ///
    /// Requests land in `out` tagged with the child's handle.
    pub fn run_child_director(
        &mut self,
        child: ContextHandle,
        out: &mut DirectorEvaluationResult,
    ) -> CamRigResult<()> {
        let ctx = self.arena.require_mut(child)?;
        if !ctx.is_active() {
            ctx.activate(self.registry)?;
        }
        let Some(mut director) = ctx.take_director() else {
            return Ok(());
        };
        let res = {
            let mut sub =
                DirectorRunContext::new(&mut *self.arena, self.registry, child, self.delta_time);
            director.run(&mut sub, out)
        };
        if let Some(ctx) = self.arena.get_mut(child) {
            ctx.restore_director(director);
        }
        res
    }

    /// Deactivate `child` and release its rigs through `out`.
    ///
    /// A child that was destroyed in the meantime is only released.
    pub fn deactivate_child_director(
        &mut self,
        child: ContextHandle,
        out: &mut DirectorEvaluationResult,
    ) -> CamRigResult<()> {
        out.release_context(child);
        match self.arena.get_mut(child) {
            Some(ctx) if ctx.is_active() => ctx.deactivate(),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for DirectorRunContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectorRunContext")
            .field("context", &self.context)
            .field("delta_time", &self.delta_time)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/director/director.rs"]
mod tests;
