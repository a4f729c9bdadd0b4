use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::foundation::error::CamRigResult;
use crate::foundation::ids::RigId;
use crate::result::evaluation_result::EvaluationResult;
use crate::rig::asset::CameraRigAsset;
use crate::rig::node::{CameraNode, CameraNodeEvaluator, NodeEvaluationParams};

/// Root node of a combined rig: each constituent's root in order.
#[derive(Debug)]
pub struct CombinedRigsNode {
    rigs: Vec<(RigId, Arc<dyn CameraNode>)>,
}

impl CombinedRigsNode {
    pub(crate) fn new(rigs: &[Arc<CameraRigAsset>]) -> Self {
        Self {
            rigs: rigs.iter().map(|r| (r.id(), Arc::clone(r.root()))).collect(),
        }
    }

    /// Constituent rig ids, in evaluation order.
    pub fn rig_ids(&self) -> impl Iterator<Item = RigId> + '_ {
        self.rigs.iter().map(|(id, _)| *id)
    }
}

#[derive(Debug)]
struct CombinedRigsEvaluator {
    children: Vec<Box<dyn CameraNodeEvaluator>>,
}

impl CameraNode for CombinedRigsNode {
    fn name(&self) -> &str {
        "combined_rigs"
    }

    fn build_evaluator(&self) -> Box<dyn CameraNodeEvaluator> {
        Box::new(CombinedRigsEvaluator {
            children: self.rigs.iter().map(|(_, n)| n.build_evaluator()).collect(),
        })
    }
}

impl CameraNodeEvaluator for CombinedRigsEvaluator {
    fn run(&mut self, params: &NodeEvaluationParams, out: &mut EvaluationResult) {
        for child in &mut self.children {
            child.run(params, out);
        }
    }

    fn for_each_child(&self, f: &mut dyn FnMut(&dyn CameraNodeEvaluator)) {
        for child in &self.children {
            f(child.as_ref());
        }
    }

    fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut dyn CameraNodeEvaluator)) {
        for child in &mut self.children {
            f(child.as_mut());
        }
    }
}

type CombinationKey = SmallVec<[RigId; 4]>;

/// Combined rigs keyed by their ordered constituent ids.
#[derive(Debug, Default)]
pub struct CombinedRigCache {
    entries: HashMap<CombinationKey, Arc<CameraRigAsset>>,
}

impl CombinedRigCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Combined rig for `rigs`, built on first use.
    pub fn get_or_build(
        &mut self,
        rigs: &[Arc<CameraRigAsset>],
    ) -> CamRigResult<Arc<CameraRigAsset>> {
        let key: CombinationKey = rigs.iter().map(|r| r.id()).collect();
        if let Some(hit) = self.entries.get(&key) {
            return Ok(Arc::clone(hit));
        }
        let combined = Arc::new(CameraRigAsset::combined(rigs)?);
        tracing::debug!(rig = combined.name(), "built combined rig");
        self.entries.insert(key, Arc::clone(&combined));
        Ok(combined)
    }

    /// Number of cached combinations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached combination.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/combined.rs"]
mod tests;
