//! Built-in rig nodes.
use std::f64::consts::TAU;
use std::sync::Arc;

use crate::foundation::core::{DVec3, Rotator, Transform3, normalize_axis};
use crate::foundation::error::CamRigResult;
use crate::foundation::ids::VariableId;
use crate::result::allocation::VariableValue;
use crate::result::evaluation_result::EvaluationResult;
use crate::result::post_process::PostProcessSettings;
use crate::rig::archive::{StateReader, StateWriter};
use crate::rig::node::{
    CameraNode, CameraNodeEvaluator, NodeEvaluationParams, NodeEvaluatorFlags,
    NodeInitializeParams, NodeOperationParams,
};
use crate::rig::operation::CameraOperation;

/// Runs its children in order.
#[derive(Debug, Default)]
pub struct ArrayNode {
    /// Child nodes.
    pub children: Vec<Arc<dyn CameraNode>>,
}

impl ArrayNode {
    /// Array of `children`.
    pub fn new(children: Vec<Arc<dyn CameraNode>>) -> Self {
        Self { children }
    }
}

#[derive(Debug)]
struct ArrayEvaluator {
    children: Vec<Box<dyn CameraNodeEvaluator>>,
}

impl CameraNode for ArrayNode {
    fn name(&self) -> &str {
        "array"
    }

    fn build_evaluator(&self) -> Box<dyn CameraNodeEvaluator> {
        Box::new(ArrayEvaluator {
            children: self.children.iter().map(|c| c.build_evaluator()).collect(),
        })
    }
}

impl CameraNodeEvaluator for ArrayEvaluator {
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

/// Space an [`OffsetNode`] offset is expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OffsetSpace {
    /// Rotated by the current camera rotation.
    #[default]
    Camera,
    /// Added as-is.
    World,
}

/// Moves the camera by a fixed offset.
#[derive(Clone, Copy, Debug)]
pub struct OffsetNode {
    /// Translation to apply.
    pub offset: DVec3,
    /// Space of `offset`.
    pub space: OffsetSpace,
}

impl CameraNode for OffsetNode {
    fn name(&self) -> &str {
        "offset"
    }

    fn build_evaluator(&self) -> Box<dyn CameraNodeEvaluator> {
        Box::new(*self)
    }
}

impl CameraNodeEvaluator for OffsetNode {
    fn run(&mut self, _params: &NodeEvaluationParams, out: &mut EvaluationResult) {
        let delta = match self.space {
            OffsetSpace::Camera => out.pose.rotation().rotate_vector(self.offset),
            OffsetSpace::World => self.offset,
        };
        let location = out.pose.location() + delta;
        out.pose.set_location(location);
    }
}

/// Two-bone arm: a pivot above the owner and a boom hanging off it.
///
/// Publishes its pivot as the [`VariableId::YAW_PITCH`] joint and absorbs yaw/pitch
/// operations, pitch clamped to `[min_pitch, max_pitch]`.
#[derive(Clone, Copy, Debug)]
pub struct BoomArmNode {
    /// Pivot location relative to the incoming camera location (world space).
    pub pivot_offset: DVec3,
    /// Camera location relative to the pivot, in pivot space.
    pub boom_offset: DVec3,
    /// Yaw/pitch the arm starts with.
    pub initial_orientation: Rotator,
    /// Lowest allowed pitch, degrees.
    pub min_pitch: f64,
    /// Highest allowed pitch, degrees.
    pub max_pitch: f64,
    /// Auto-reset rotator variable carrying a per-frame look delta.
    pub input_variable: Option<VariableId>,
}

impl Default for BoomArmNode {
    fn default() -> Self {
        Self {
            pivot_offset: DVec3::ZERO,
            boom_offset: DVec3::new(-300.0, 0.0, 0.0),
            initial_orientation: Rotator::ZERO,
            min_pitch: -89.0,
            max_pitch: 89.0,
            input_variable: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
struct YawPitch {
    yaw: f64,
    pitch: f64,
}

#[derive(Debug)]
struct BoomArmEvaluator {
    node: BoomArmNode,
    state: YawPitch,
}

impl BoomArmEvaluator {
    fn apply_pitch(&mut self, delta: f64) -> f64 {
        let target = (self.state.pitch + delta).clamp(self.node.min_pitch, self.node.max_pitch);
        let applied = target - self.state.pitch;
        self.state.pitch = target;
        applied
    }

    fn apply_yaw(&mut self, delta: f64) {
        self.state.yaw = normalize_axis(self.state.yaw + delta);
    }

    fn orientation(&self) -> Rotator {
        Rotator::new(self.state.pitch, self.state.yaw, 0.0)
    }
}

impl CameraNode for BoomArmNode {
    fn name(&self) -> &str {
        "boom_arm"
    }

    fn build_evaluator(&self) -> Box<dyn CameraNodeEvaluator> {
        Box::new(BoomArmEvaluator {
            node: *self,
            state: YawPitch::default(),
        })
    }
}

impl CameraNodeEvaluator for BoomArmEvaluator {
    fn flags(&self) -> NodeEvaluatorFlags {
        NodeEvaluatorFlags::ARTICULATED
    }

    fn initialize(&mut self, _params: &NodeInitializeParams, _out: &mut EvaluationResult) {
        self.state = YawPitch {
            yaw: normalize_axis(self.node.initial_orientation.yaw),
            pitch: self.node.initial_orientation.pitch,
        };
        self.apply_pitch(0.0);
    }

    fn run(&mut self, _params: &NodeEvaluationParams, out: &mut EvaluationResult) {
        if let Some(var) = self.node.input_variable {
            if let Some(VariableValue::Rotator(delta)) = out.variable_table.get_written(var).copied()
            {
                self.apply_yaw(delta.yaw);
                self.apply_pitch(delta.pitch);
            }
        }

        let rotation = self.orientation();
        let pivot = out.pose.location() + self.node.pivot_offset;
        out.joints
            .add_joint(VariableId::YAW_PITCH, Transform3::new(pivot, rotation));
        out.pose
            .set_location(pivot + rotation.rotate_vector(self.node.boom_offset));
        out.pose.set_rotation(rotation);
    }

    fn execute_operation(&mut self, _params: &NodeOperationParams, op: &mut CameraOperation) {
        match op {
            CameraOperation::YawPitch(yp) => {
                let yaw = yp.yaw.take();
                self.apply_yaw(yaw);
                let applied = self.apply_pitch(yp.pitch.remaining());
                yp.pitch.consume(applied);
            }
        }
    }

    fn serialize_state(&self, w: &mut StateWriter) -> CamRigResult<()> {
        w.write(&self.state)
    }

    fn deserialize_state(&mut self, r: &mut StateReader<'_>) -> CamRigResult<()> {
        self.state = r.read()?;
        Ok(())
    }
}

/// Sets the field of view.
#[derive(Clone, Copy, Debug)]
pub struct FieldOfViewNode {
    /// Horizontal field of view, degrees.
    pub field_of_view: f64,
}

impl CameraNode for FieldOfViewNode {
    fn name(&self) -> &str {
        "field_of_view"
    }

    fn build_evaluator(&self) -> Box<dyn CameraNodeEvaluator> {
        Box::new(*self)
    }
}

impl CameraNodeEvaluator for FieldOfViewNode {
    fn run(&mut self, _params: &NodeEvaluationParams, out: &mut EvaluationResult) {
        out.pose.set_field_of_view(self.field_of_view);
    }
}

/// Sets lens parameters.
#[derive(Clone, Copy, Debug)]
pub struct LensNode {
    /// Focal length in millimetres.
    pub focal_length: f64,
    /// Aperture (f-stop).
    pub aperture: f64,
    /// Focus distance, left untouched when `None`.
    pub focus_distance: Option<f64>,
}

impl CameraNode for LensNode {
    fn name(&self) -> &str {
        "lens"
    }

    fn build_evaluator(&self) -> Box<dyn CameraNodeEvaluator> {
        Box::new(*self)
    }
}

impl CameraNodeEvaluator for LensNode {
    fn run(&mut self, _params: &NodeEvaluationParams, out: &mut EvaluationResult) {
        out.pose.set_focal_length(self.focal_length);
        out.pose.set_aperture(self.aperture);
        if let Some(d) = self.focus_distance {
            out.pose.set_focus_distance(d);
        }
    }
}

/// Applies post-process overrides.
#[derive(Clone, Copy, Debug)]
pub struct PostProcessNode {
    /// Overrides to apply.
    pub settings: PostProcessSettings,
}

impl CameraNode for PostProcessNode {
    fn name(&self) -> &str {
        "post_process"
    }

    fn build_evaluator(&self) -> Box<dyn CameraNodeEvaluator> {
        Box::new(*self)
    }
}

impl CameraNodeEvaluator for PostProcessNode {
    fn run(&mut self, _params: &NodeEvaluationParams, out: &mut EvaluationResult) {
        out.post_process.override_from(&self.settings);
    }
}

/// Writes a constant into a variable every evaluation.
#[derive(Clone, Copy, Debug)]
pub struct SetVariableNode {
    /// Target slot.
    pub variable: VariableId,
    /// Value written.
    pub value: VariableValue,
}

impl CameraNode for SetVariableNode {
    fn name(&self) -> &str {
        "set_variable"
    }

    fn build_evaluator(&self) -> Box<dyn CameraNodeEvaluator> {
        Box::new(*self)
    }
}

impl CameraNodeEvaluator for SetVariableNode {
    fn run(&mut self, _params: &NodeEvaluationParams, out: &mut EvaluationResult) {
        if let Err(err) = out.variable_table.set(self.variable, self.value) {
            tracing::warn!(variable = ?self.variable, %err, "set_variable node skipped");
        }
    }
}

/// Sinusoidal rotation shake, typically run on the Visual layer.
#[derive(Clone, Copy, Debug)]
pub struct ShakeNode {
    /// Peak offset per axis, degrees.
    pub amplitude: Rotator,
    /// Oscillation frequency.
    pub frequency_hz: f64,
}

#[derive(Debug)]
struct ShakeEvaluator {
    node: ShakeNode,
    elapsed_secs: f64,
}

impl CameraNode for ShakeNode {
    fn name(&self) -> &str {
        "shake"
    }

    fn build_evaluator(&self) -> Box<dyn CameraNodeEvaluator> {
        Box::new(ShakeEvaluator {
            node: *self,
            elapsed_secs: 0.0,
        })
    }
}

impl CameraNodeEvaluator for ShakeEvaluator {
    fn flags(&self) -> NodeEvaluatorFlags {
        NodeEvaluatorFlags::STATEFUL
    }

    fn run(&mut self, params: &NodeEvaluationParams, out: &mut EvaluationResult) {
        self.elapsed_secs += params.delta_time;
        let s = (TAU * self.node.frequency_hz * self.elapsed_secs).sin();
        let a = self.node.amplitude;
        let offset = Rotator::new(a.pitch * s, a.yaw * s, a.roll * s);
        let rotation = (out.pose.rotation() + offset).normalized();
        out.pose.set_rotation(rotation);
    }

    fn serialize_state(&self, w: &mut StateWriter) -> CamRigResult<()> {
        w.write(&self.elapsed_secs)
    }

    fn deserialize_state(&mut self, r: &mut StateReader<'_>) -> CamRigResult<()> {
        self.elapsed_secs = r.read()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/nodes.rs"]
mod tests;
