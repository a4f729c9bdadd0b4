use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::director::director::Director;
use crate::director::priority_queue::PriorityQueueDirectorFactory;
use crate::director::single_rig::SingleRigDirectorFactory;
use crate::foundation::error::{CamRigError, CamRigResult};
use crate::rig::asset::{CameraAsset, CameraRigAsset};

/// Builds directors of one class.
pub trait DirectorFactory: fmt::Debug + Send + Sync {
    /// Build a director for `asset` from class-specific `params`.
    fn build_director(
        &self,
        asset: &Arc<CameraAsset>,
        params: &serde_json::Value,
    ) -> CamRigResult<Box<dyn Director>>;

    /// Rigs a director built from `params` may activate. Defaults to every rig of the asset.
    fn gather_rig_usage(
        &self,
        asset: &CameraAsset,
        _params: &serde_json::Value,
    ) -> CamRigResult<Vec<Arc<CameraRigAsset>>> {
        Ok(asset.rigs().to_vec())
    }
}

/// Director factories by class name.
#[derive(Debug, Default, Clone)]
pub struct DirectorRegistry {
    factories: BTreeMap<String, Arc<dyn DirectorFactory>>,
}

impl DirectorRegistry {
    /// Name of the built-in single-rig director.
    pub const SINGLE_RIG: &'static str = "single_rig";
    /// Name of the built-in priority-queue director.
    pub const PRIORITY_QUEUE: &'static str = "priority_queue";

    /// Registry without any class.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the built-in classes.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Self::SINGLE_RIG, Arc::new(SingleRigDirectorFactory));
        registry.register(Self::PRIORITY_QUEUE, Arc::new(PriorityQueueDirectorFactory));
        registry
    }

    /// Register `factory` under `class`, returning the factory it replaces.
    pub fn register(
        &mut self,
        class: impl Into<String>,
        factory: Arc<dyn DirectorFactory>,
    ) -> Option<Arc<dyn DirectorFactory>> {
        self.factories.insert(class.into(), factory)
    }

    /// Return `true` when `class` is registered.
    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    /// Registered class names.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    fn factory_for<'a>(
        &'a self,
        asset: &'a CameraAsset,
    ) -> CamRigResult<(&'a Arc<dyn DirectorFactory>, &'a serde_json::Value)> {
        let config = asset.director.as_ref().ok_or_else(|| {
            CamRigError::configuration(format!("camera asset '{}' has no director", asset.name))
        })?;
        let factory = self.factories.get(&config.class).ok_or_else(|| {
            CamRigError::configuration(format!(
                "camera asset '{}' uses unknown director class '{}'",
                asset.name, config.class
            ))
        })?;
        Ok((factory, &config.params))
    }

    /// Build the director `asset` declares.
    pub fn build_director(&self, asset: &Arc<CameraAsset>) -> CamRigResult<Box<dyn Director>> {
        let (factory, params) = self.factory_for(asset)?;
        factory.build_director(asset, params)
    }

    /// Rigs the director `asset` declares may activate.
    pub fn gather_rig_usage(&self, asset: &CameraAsset) -> CamRigResult<Vec<Arc<CameraRigAsset>>> {
        let (factory, params) = self.factory_for(asset)?;
        factory.gather_rig_usage(asset, params)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/director/registry.rs"]
mod tests;
