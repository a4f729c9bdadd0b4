use std::fmt;

use crate::context::arena::ContextHandle;
use crate::foundation::error::CamRigResult;
use crate::foundation::ids::RigInstanceId;
use crate::result::evaluation_result::EvaluationResult;
use crate::rig::archive::{StateReader, StateWriter};
use crate::rig::operation::CameraOperation;

/// Capabilities a node evaluator opts into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeEvaluatorFlags {
    /// Receives broadcast [`CameraOperation`]s.
    pub supports_operations: bool,
    /// Carries private state written by `serialize_state`.
    pub supports_serialization: bool,
}

impl NodeEvaluatorFlags {
    /// No capability.
    pub const NONE: Self = Self {
        supports_operations: false,
        supports_serialization: false,
    };

    /// Stateful node that also reacts to operations.
    pub const ARTICULATED: Self = Self {
        supports_operations: true,
        supports_serialization: true,
    };

    /// Stateful node.
    pub const STATEFUL: Self = Self {
        supports_operations: false,
        supports_serialization: true,
    };
}

/// Parameters passed once when a rig instance is created.
#[derive(Clone, Copy, Debug)]
pub struct NodeInitializeParams {
    /// Context that activated the rig.
    pub context: ContextHandle,
    /// Instance being created.
    pub instance: RigInstanceId,
}

/// Parameters passed to every evaluation.
#[derive(Clone, Copy, Debug)]
pub struct NodeEvaluationParams {
    /// Context that activated the rig.
    pub context: ContextHandle,
    /// Frame delta time in seconds.
    pub delta_time: f64,
    /// First evaluation of this instance.
    pub is_first_frame: bool,
    /// Evaluation happens inside the aim-solver sandbox.
    pub is_isolated: bool,
}

/// Parameters passed with a broadcast operation.
#[derive(Clone, Copy, Debug)]
pub struct NodeOperationParams {
    /// Context that activated the rig.
    pub context: ContextHandle,
}

/// Runtime counterpart of a [`CameraNode`].
///
/// Parents own their children and are responsible for running them; traversal helpers
/// reach children through `for_each_child` / `for_each_child_mut`.
pub trait CameraNodeEvaluator: fmt::Debug {
    /// Capabilities of this evaluator.
    fn flags(&self) -> NodeEvaluatorFlags {
        NodeEvaluatorFlags::NONE
    }

    /// Called once before the first evaluation. Children are initialized by the tree.
    fn initialize(&mut self, _params: &NodeInitializeParams, _out: &mut EvaluationResult) {}

    /// Evaluate into `out`.
    fn run(&mut self, params: &NodeEvaluationParams, out: &mut EvaluationResult);

    /// Consume some or all of `op`; leave the rest.
    fn execute_operation(&mut self, _params: &NodeOperationParams, _op: &mut CameraOperation) {}

    /// Write private state. Must round-trip through `deserialize_state` byte for byte.
    fn serialize_state(&self, _w: &mut StateWriter) -> CamRigResult<()> {
        Ok(())
    }

    /// Read back what `serialize_state` wrote.
    fn deserialize_state(&mut self, _r: &mut StateReader<'_>) -> CamRigResult<()> {
        Ok(())
    }

    /// Visit direct children.
    fn for_each_child(&self, _f: &mut dyn FnMut(&dyn CameraNodeEvaluator)) {}

    /// Visit direct children mutably.
    fn for_each_child_mut(&mut self, _f: &mut dyn FnMut(&mut dyn CameraNodeEvaluator)) {}
}

/// Authored node of a rig's node tree.
pub trait CameraNode: fmt::Debug + Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    /// Build a fresh evaluator (and, recursively, evaluators for child nodes).
    fn build_evaluator(&self) -> Box<dyn CameraNodeEvaluator>;
}

fn visit_rec(node: &dyn CameraNodeEvaluator, f: &mut dyn FnMut(&dyn CameraNodeEvaluator)) {
    f(node);
    node.for_each_child(&mut |child| visit_rec(child, &mut *f));
}

fn visit_mut_rec(
    node: &mut dyn CameraNodeEvaluator,
    f: &mut dyn FnMut(&mut dyn CameraNodeEvaluator),
) {
    f(node);
    node.for_each_child_mut(&mut |child| visit_mut_rec(child, &mut *f));
}

/// Evaluator hierarchy of one rig instance.
#[derive(Debug)]
pub struct NodeEvaluatorTree {
    root: Box<dyn CameraNodeEvaluator>,
}

impl NodeEvaluatorTree {
    /// Build the evaluator hierarchy for `root`.
    pub fn build(root: &dyn CameraNode) -> Self {
        Self {
            root: root.build_evaluator(),
        }
    }

    /// Initialize every evaluator, parents first.
    pub fn initialize(&mut self, params: &NodeInitializeParams, out: &mut EvaluationResult) {
        self.visit_mut(&mut |node| node.initialize(params, out));
    }

    /// Evaluate the hierarchy into `out`.
    pub fn run(&mut self, params: &NodeEvaluationParams, out: &mut EvaluationResult) {
        self.root.run(params, out);
    }

    /// Depth-first pre-order visit.
    pub fn visit(&self, f: &mut dyn FnMut(&dyn CameraNodeEvaluator)) {
        visit_rec(self.root.as_ref(), f);
    }

    /// Depth-first pre-order mutable visit.
    pub fn visit_mut(&mut self, f: &mut dyn FnMut(&mut dyn CameraNodeEvaluator)) {
        visit_mut_rec(self.root.as_mut(), f);
    }

    /// Number of evaluators in the hierarchy.
    pub fn evaluator_count(&self) -> usize {
        let mut n = 0;
        self.visit(&mut |_| n += 1);
        n
    }

    /// Append the state of every serializable evaluator, in pre-order.
    pub fn serialize_state(&self, w: &mut StateWriter) -> CamRigResult<()> {
        let mut res = Ok(());
        self.visit(&mut |node| {
            if res.is_ok() && node.flags().supports_serialization {
                res = node.serialize_state(w);
            }
        });
        res
    }

    /// Restore what [`NodeEvaluatorTree::serialize_state`] wrote.
    pub fn deserialize_state(&mut self, r: &mut StateReader<'_>) -> CamRigResult<()> {
        let mut res = Ok(());
        self.visit_mut(&mut |node| {
            if res.is_ok() && node.flags().supports_serialization {
                res = node.deserialize_state(r);
            }
        });
        res
    }

    /// Offer `op` to every operation-capable evaluator, in pre-order.
    pub fn execute_operation(&mut self, params: &NodeOperationParams, op: &mut CameraOperation) {
        self.visit_mut(&mut |node| {
            if node.flags().supports_operations {
                node.execute_operation(params, op);
            }
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/node.rs"]
mod tests;
