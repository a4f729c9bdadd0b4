use std::collections::BTreeMap;
use std::sync::Arc;

use crate::foundation::error::{CamRigError, CamRigResult};
use crate::foundation::ids::RigId;
use crate::foundation::math::StableHasher;
use crate::result::allocation::AllocationInfo;
use crate::rig::combined::CombinedRigsNode;
use crate::rig::node::{CameraNode, NodeEvaluatorTree};
use crate::rig::transition::TransitionSpec;

const RIG_NAME_TAG: u8 = 0x01;
const COMBINED_TAG: u8 = 0x02;

impl RigId {
    /// Stable id derived from a rig name.
    pub fn from_name(name: &str) -> Self {
        let mut h = StableHasher::new();
        h.write_u8(RIG_NAME_TAG);
        h.write_str(name);
        Self(h.finish())
    }

    /// Stable id of the combination of `constituents`, order-sensitive.
    pub fn combined(constituents: &[RigId]) -> Self {
        let mut h = StableHasher::new();
        h.write_u8(COMBINED_TAG);
        h.write_u32(constituents.len() as u32);
        for id in constituents {
            h.write_u64(id.0);
        }
        Self(h.finish())
    }
}

/// Authored camera rig: a node tree plus the table layout it needs.
#[derive(Debug)]
pub struct CameraRigAsset {
    id: RigId,
    name: String,
    root: Arc<dyn CameraNode>,
    /// Variable and data slots the rig reads or writes.
    pub allocation_info: AllocationInfo,
    /// Transition used when the rig becomes active; `None` uses the system default.
    pub enter_transition: Option<TransitionSpec>,
    /// Transition used when the rig is deactivated; `None` uses the system default.
    pub exit_transition: Option<TransitionSpec>,
    constituents: Vec<RigId>,
}

impl CameraRigAsset {
    /// Rig named `name` evaluating `root`.
    pub fn new(name: impl Into<String>, root: Arc<dyn CameraNode>) -> Self {
        let name = name.into();
        Self {
            id: RigId::from_name(&name),
            name,
            root,
            allocation_info: AllocationInfo::default(),
            enter_transition: None,
            exit_transition: None,
            constituents: Vec::new(),
        }
    }

    /// Set the allocation info.
    pub fn with_allocation_info(mut self, info: AllocationInfo) -> Self {
        self.allocation_info = info;
        self
    }

    /// Set the enter transition.
    pub fn with_enter_transition(mut self, transition: TransitionSpec) -> Self {
        self.enter_transition = Some(transition);
        self
    }

    /// Set the exit transition.
    pub fn with_exit_transition(mut self, transition: TransitionSpec) -> Self {
        self.exit_transition = Some(transition);
        self
    }

    /// Synthetic rig running `rigs` one after another on the same result.
    ///
    /// The id only depends on the ordered constituent ids. Allocation infos are merged,
    /// earlier rigs winning on collisions; the first rig's transitions are used.
    pub fn combined(rigs: &[Arc<CameraRigAsset>]) -> CamRigResult<Self> {
        if rigs.len() < 2 {
            return Err(CamRigError::combination(format!(
                "a combined rig needs at least two constituents, got {}",
                rigs.len()
            )));
        }
        let constituents: Vec<RigId> = rigs.iter().map(|r| r.id).collect();
        let name = rigs
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join("+");
        let allocation_info = rigs
            .iter()
            .fold(AllocationInfo::default(), |acc, r| acc.merged(&r.allocation_info));
        Ok(Self {
            id: RigId::combined(&constituents),
            name,
            root: Arc::new(CombinedRigsNode::new(rigs)),
            allocation_info,
            enter_transition: rigs[0].enter_transition,
            exit_transition: rigs[0].exit_transition,
            constituents,
        })
    }

    /// Stable rig id.
    pub fn id(&self) -> RigId {
        self.id
    }

    /// Rig name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root node.
    pub fn root(&self) -> &Arc<dyn CameraNode> {
        &self.root
    }

    /// Constituent ids of a combined rig; empty otherwise.
    pub fn constituents(&self) -> &[RigId] {
        &self.constituents
    }

    /// Return `true` for rigs built by [`CameraRigAsset::combined`].
    pub fn is_combined(&self) -> bool {
        !self.constituents.is_empty()
    }

    /// Fresh evaluator hierarchy for one instance of this rig.
    pub fn build_evaluator_tree(&self) -> NodeEvaluatorTree {
        NodeEvaluatorTree::build(self.root.as_ref())
    }
}

/// Rig named directly or through the requesting context's proxy table.
#[derive(Clone, Debug)]
pub enum RigReference {
    /// Concrete rig.
    Rig(Arc<CameraRigAsset>),
    /// Proxy name resolved against the camera asset.
    Proxy(String),
}

impl RigReference {
    /// Human readable label for diagnostics.
    pub fn label(&self) -> &str {
        match self {
            Self::Rig(rig) => rig.name(),
            Self::Proxy(name) => name,
        }
    }
}

impl From<Arc<CameraRigAsset>> for RigReference {
    fn from(rig: Arc<CameraRigAsset>) -> Self {
        Self::Rig(rig)
    }
}

impl From<String> for RigReference {
    fn from(proxy: String) -> Self {
        Self::Proxy(proxy)
    }
}

impl From<&str> for RigReference {
    fn from(proxy: &str) -> Self {
        Self::Proxy(proxy.to_owned())
    }
}

/// Which director a camera asset uses, and its parameters.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DirectorConfig {
    /// Registered director class name.
    pub class: String,
    /// Class-specific parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl DirectorConfig {
    /// Config for `class` with `params`.
    pub fn new(class: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            class: class.into(),
            params,
        }
    }
}

/// Camera asset owned by an evaluation context.
#[derive(Debug, Default)]
pub struct CameraAsset {
    /// Asset name.
    pub name: String,
    /// Director used by contexts built from this asset.
    pub director: Option<DirectorConfig>,
    /// Layout of the initial result of contexts built from this asset.
    pub allocation_info: AllocationInfo,
    rigs: Vec<Arc<CameraRigAsset>>,
    rig_proxies: BTreeMap<String, String>,
}

impl CameraAsset {
    /// Empty asset named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the director config.
    pub fn with_director(mut self, config: DirectorConfig) -> Self {
        self.director = Some(config);
        self
    }

    /// Add a rig. Its allocation info is merged into the asset's.
    pub fn with_rig(mut self, rig: Arc<CameraRigAsset>) -> Self {
        self.allocation_info = self.allocation_info.merged(&rig.allocation_info);
        self.rigs.push(rig);
        self
    }

    /// Map proxy name `proxy` to the rig named `rig_name`.
    pub fn with_proxy(mut self, proxy: impl Into<String>, rig_name: impl Into<String>) -> Self {
        self.rig_proxies.insert(proxy.into(), rig_name.into());
        self
    }

    /// Rigs owned by this asset.
    pub fn rigs(&self) -> &[Arc<CameraRigAsset>] {
        &self.rigs
    }

    /// Rig named `name`.
    pub fn find_rig(&self, name: &str) -> Option<&Arc<CameraRigAsset>> {
        self.rigs.iter().find(|r| r.name() == name)
    }

    /// Return `true` when `name` is a declared proxy.
    pub fn has_proxy(&self, name: &str) -> bool {
        self.rig_proxies.contains_key(name)
    }

    /// Rig a proxy maps to.
    pub fn resolve_proxy(&self, proxy: &str) -> Option<&Arc<CameraRigAsset>> {
        self.rig_proxies
            .get(proxy)
            .and_then(|rig_name| self.find_rig(rig_name))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/asset.rs"]
mod tests;
