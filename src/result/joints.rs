use smallvec::SmallVec;

use crate::foundation::core::Transform3;
use crate::foundation::ids::VariableId;

/// Named transform published by a rig node during evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRigJoint {
    /// Variable the joint is tagged with (e.g. [`VariableId::YAW_PITCH`]).
    pub variable_id: VariableId,
    /// World-space pivot transform.
    pub transform: Transform3,
}

/// Joints published during one evaluation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CameraRigJoints {
    joints: SmallVec<[CameraRigJoint; 2]>,
}

impl CameraRigJoints {
    /// Publish a joint, replacing any previous joint with the same tag.
    pub fn add_joint(&mut self, variable_id: VariableId, transform: Transform3) {
        match self.joints.iter_mut().find(|j| j.variable_id == variable_id) {
            Some(j) => j.transform = transform,
            None => self.joints.push(CameraRigJoint {
                variable_id,
                transform,
            }),
        }
    }

    /// Joint tagged with `variable_id`.
    pub fn find(&self, variable_id: VariableId) -> Option<&CameraRigJoint> {
        self.joints.iter().find(|j| j.variable_id == variable_id)
    }

    /// All published joints.
    pub fn iter(&self) -> impl Iterator<Item = &CameraRigJoint> {
        self.joints.iter()
    }

    /// Return `true` when nothing is published.
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Drop every joint.
    pub fn reset(&mut self) {
        self.joints.clear();
    }

    /// Merge `other`'s joints in, by tag; joints only `self` has are kept.
    pub fn override_from(&mut self, other: &CameraRigJoints) {
        for j in &other.joints {
            self.add_joint(j.variable_id, j.transform);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/result/joints.rs"]
mod tests;
