use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use crate::context::arena::ContextHandle;
use crate::director::director::{DirectorInstance, DirectorLifecycleParams};
use crate::director::registry::DirectorRegistry;
use crate::foundation::error::{CamRigError, CamRigResult};
use crate::result::allocation::AllocationInfo;
use crate::result::evaluation_result::EvaluationResult;
use crate::rig::asset::CameraAsset;

type WeakObject = Weak<dyn Any + Send + Sync>;

/// Weak references to whatever owns a context and drives its input.
#[derive(Clone, Debug, Default)]
pub struct ContextOwnerInfo {
    owner: Option<WeakObject>,
    input_controller: Option<WeakObject>,
}

impl ContextOwnerInfo {
    /// Owned by `owner`.
    pub fn new<T: Any + Send + Sync>(owner: &Arc<T>) -> Self {
        let owner: Arc<dyn Any + Send + Sync> = owner.clone();
        Self {
            owner: Some(Arc::downgrade(&owner)),
            input_controller: None,
        }
    }

    /// Attach an input controller.
    pub fn with_input_controller<T: Any + Send + Sync>(mut self, controller: &Arc<T>) -> Self {
        let controller: Arc<dyn Any + Send + Sync> = controller.clone();
        self.input_controller = Some(Arc::downgrade(&controller));
        self
    }

    /// Owner, while it is alive.
    pub fn owner(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.owner.as_ref().and_then(Weak::upgrade)
    }

    /// Input controller, while it is alive.
    pub fn input_controller(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.input_controller.as_ref().and_then(Weak::upgrade)
    }
}

/// Condition under which a conditional result is overlaid on the initial result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResultCondition {
    /// The owning context is the active one.
    ActiveContext,
    /// The rig being evaluated is the top Main instance.
    ActiveCameraRig,
}

/// One logical camera owner.
#[derive(Debug)]
pub struct EvaluationContext {
    name: String,
    pub(crate) handle: ContextHandle,
    owner_info: ContextOwnerInfo,
    asset: Option<Arc<CameraAsset>>,
    initial_result: EvaluationResult,
    conditional_results: BTreeMap<ResultCondition, EvaluationResult>,
    director: Option<DirectorInstance>,
    pub(crate) parent: Option<ContextHandle>,
    pub(crate) children: Vec<ContextHandle>,
    priority: i32,
    initialized: bool,
    active: bool,
}

impl EvaluationContext {
    /// Uninitialized context built from `asset`.
    pub fn new(name: impl Into<String>, asset: Option<Arc<CameraAsset>>) -> Self {
        Self {
            name: name.into(),
            handle: ContextHandle::new(u32::MAX, u32::MAX),
            owner_info: ContextOwnerInfo::default(),
            asset,
            initial_result: EvaluationResult::default(),
            conditional_results: BTreeMap::new(),
            director: None,
            parent: None,
            children: Vec::new(),
            priority: 0,
            initialized: false,
            active: false,
        }
    }

    /// Context name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle assigned by the arena.
    pub fn handle(&self) -> ContextHandle {
        self.handle
    }

    /// Owner references.
    pub fn owner_info(&self) -> &ContextOwnerInfo {
        &self.owner_info
    }

    /// Source camera asset.
    pub fn asset(&self) -> Option<&Arc<CameraAsset>> {
        self.asset.as_ref()
    }

    /// Parent context.
    pub fn parent(&self) -> Option<ContextHandle> {
        self.parent
    }

    /// Child contexts, in registration order.
    pub fn children(&self) -> &[ContextHandle] {
        &self.children
    }

    /// Priority used by composable directors to pick among siblings.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Set the priority.
    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// `initialize` has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Between `activate` and `deactivate`.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// One-time setup. Allocates the initial result from the asset's allocation info.
    pub fn initialize(&mut self, owner_info: ContextOwnerInfo) -> CamRigResult<()> {
        if self.initialized {
            let err = CamRigError::protocol(format!("context '{}' initialized twice", self.name));
            tracing::warn!(context = %self.name, %err, "ignoring initialize");
            return Err(err);
        }
        self.owner_info = owner_info;
        if let Some(asset) = &self.asset {
            self.initial_result.allocate(&asset.allocation_info);
        }
        self.initialized = true;
        Ok(())
    }

    /// Activate, building the director on first use.
    ///
    /// A director that cannot be built is logged and the context activates without one.
    pub fn activate(&mut self, registry: &DirectorRegistry) -> CamRigResult<()> {
        if !self.initialized {
            return Err(CamRigError::protocol(format!(
                "context '{}' activated before initialize",
                self.name
            )));
        }
        if self.active {
            return Err(CamRigError::protocol(format!(
                "context '{}' is already active",
                self.name
            )));
        }
        if self.director.is_none() {
            self.director = self.build_director(registry);
        }
        let params = DirectorLifecycleParams {
            context: self.handle,
        };
        if let Some(director) = &mut self.director {
            director.activate(&params)?;
        }
        self.active = true;
        Ok(())
    }

    fn build_director(&self, registry: &DirectorRegistry) -> Option<DirectorInstance> {
        let built = match &self.asset {
            Some(asset) => registry.build_director(asset),
            None => Err(CamRigError::configuration(format!(
                "context '{}' has no camera asset",
                self.name
            ))),
        };
        let mut instance = match built {
            Ok(director) => DirectorInstance::new(director),
            Err(err) => {
                tracing::error!(context = %self.name, %err, "no director for context");
                return None;
            }
        };
        let params = DirectorLifecycleParams {
            context: self.handle,
        };
        match instance.initialize(&params) {
            Ok(()) => Some(instance),
            Err(err) => {
                tracing::error!(context = %self.name, %err, "director failed to initialize");
                None
            }
        }
    }

    /// Deactivate. The director is kept for the next activation.
    pub fn deactivate(&mut self) -> CamRigResult<()> {
        if !self.active {
            return Err(CamRigError::protocol(format!(
                "context '{}' is not active",
                self.name
            )));
        }
        let params = DirectorLifecycleParams {
            context: self.handle,
        };
        if let Some(director) = &mut self.director {
            director.deactivate(&params)?;
        }
        self.active = false;
        Ok(())
    }

    pub(crate) fn teardown(&mut self) {
        if self.active {
            if let Err(err) = self.deactivate() {
                tracing::warn!(context = %self.name, %err, "teardown");
            }
        }
        self.director = None;
    }

    /// Director, once built.
    pub fn director(&self) -> Option<&DirectorInstance> {
        self.director.as_ref()
    }

    /// Mutable director, once built.
    pub fn director_mut(&mut self) -> Option<&mut DirectorInstance> {
        self.director.as_mut()
    }

    pub(crate) fn take_director(&mut self) -> Option<DirectorInstance> {
        self.director.take()
    }

    pub(crate) fn restore_director(&mut self, director: DirectorInstance) {
        self.director = Some(director);
    }

    /// Result every rig of this context starts from.
    pub fn initial_result(&self) -> &EvaluationResult {
        &self.initial_result
    }

    /// Mutable initial result, for hosts feeding the camera.
    pub fn initial_result_mut(&mut self) -> &mut EvaluationResult {
        &mut self.initial_result
    }

    /// Conditional overlay, if one was added.
    pub fn conditional_result(&self, condition: ResultCondition) -> Option<&EvaluationResult> {
        self.conditional_results.get(&condition)
    }

    /// Conditional overlay for `condition`, created on first call.
    pub fn get_or_add_conditional_result(
        &mut self,
        condition: ResultCondition,
    ) -> &mut EvaluationResult {
        let asset = self.asset.as_ref();
        self.conditional_results.entry(condition).or_insert_with(|| {
            asset.map_or_else(EvaluationResult::default, |a| {
                EvaluationResult::new(&a.allocation_info)
            })
        })
    }

    /// Extend the initial and conditional results with `info`'s slots.
    pub fn allocate(&mut self, info: &AllocationInfo) {
        self.initial_result.allocate(info);
        for result in self.conditional_results.values_mut() {
            result.allocate(info);
        }
    }

    /// Clear frame flags and apply auto-reset on the initial and conditional results.
    pub fn on_end_of_frame(&mut self) {
        self.initial_result.on_end_of_frame();
        for result in self.conditional_results.values_mut() {
            result.on_end_of_frame();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/context/context.rs"]
mod tests;
