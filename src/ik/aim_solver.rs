use crate::context::arena::ContextHandle;
use crate::director::request::Layer;
use crate::foundation::core::{DVec3, Rotator};
use crate::foundation::error::{CamRigError, CamRigResult};
use crate::foundation::ids::{RigInstanceId, VariableId};
use crate::foundation::math::ray_sphere_exit;
use crate::result::evaluation_result::EvaluationResult;
use crate::result::table::SlotFilter;
use crate::rig::operation::{CameraOperation, YawPitchOperation};
use crate::system::evaluator::SystemEvaluator;
use crate::system::opts::AimSolverSettings;

/// Where a solve stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AimSolverState {
    /// Not run yet.
    Pending,
    /// The camera already aims at the target within tolerance.
    Completed,
    /// Corrections were applied on every iteration.
    Corrected,
    /// The rig cannot be solved: no yaw/pitch pivot, or no exit point.
    Failed,
    /// The solve was refused or stopped: target too close, correction not fully
    /// absorbed, or errors not shrinking.
    Aborted,
}

impl AimSolverState {
    /// `Completed` or `Corrected`.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Completed | Self::Corrected)
    }
}

/// Per-solve parameters. Non-positive values fall back to [`AimSolverSettings`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AimSolverParams {
    /// Angle tolerance in degrees.
    pub angle_tolerance_deg: f64,
    /// Distance tolerance.
    pub distance_tolerance: f64,
    /// Minimum distance to the target.
    pub min_distance: f64,
    /// Iteration cap.
    pub max_iterations: u32,
}

impl AimSolverParams {
    fn resolve(self, fallback: &AimSolverSettings) -> AimSolverSettings {
        let pick = |v: f64, f: f64| if v > 0.0 { v } else { f };
        AimSolverSettings {
            angle_tolerance_deg: pick(self.angle_tolerance_deg, fallback.angle_tolerance_deg),
            distance_tolerance: pick(self.distance_tolerance, fallback.distance_tolerance),
            min_distance: pick(self.min_distance, fallback.min_distance),
            max_iterations: if self.max_iterations > 0 {
                self.max_iterations
            } else {
                fallback.max_iterations.max(1)
            },
        }
    }
}

/// Aim error of one iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AimError {
    /// Angle between the line of sight and the direction to the target, degrees.
    pub angle_deg: f64,
    /// Distance between the target and the line of sight.
    pub distance: f64,
}

/// Error of a camera at the origin of `to_target` aiming along `aim_dir` (unit) at a
/// point `target_distance` away.
///
/// A target behind the camera reports the obtuse angle and its full distance.
pub(crate) fn aim_error(aim_dir: DVec3, target_distance: f64, to_target: DVec3) -> AimError {
    let distance = to_target.length();
    let orthogonal = (aim_dir * target_distance).cross(to_target).length();
    let sin = (orthogonal / (target_distance * distance)).clamp(0.0, 1.0);
    let angle_deg = sin.asin().to_degrees();
    if aim_dir.dot(to_target) < 0.0 {
        AimError {
            angle_deg: 180.0 - angle_deg,
            distance,
        }
    } else {
        AimError {
            angle_deg,
            distance: orthogonal / target_distance,
        }
    }
}

/// Iteratively turns one running rig so that its line of sight meets a world-space
/// target.
///
/// Each iteration evaluates the rig in isolation and rolls its node state back, so the
/// normal frame evaluation never sees the trial runs. Only the yaw/pitch corrections
/// offered to the rig's articulated nodes persist.
#[derive(Debug)]
pub struct AimSolver {
    instance: RigInstanceId,
    settings: AimSolverSettings,
    state: AimSolverState,
    iterations: u32,
    last_error: Option<AimError>,
    scratch: EvaluationResult,
}

impl AimSolver {
    /// Solver for rig instance `instance`.
    pub fn new(
        instance: RigInstanceId,
        params: AimSolverParams,
        fallback: &AimSolverSettings,
    ) -> Self {
        Self {
            instance,
            settings: params.resolve(fallback),
            state: AimSolverState::Pending,
            iterations: 0,
            last_error: None,
            scratch: EvaluationResult::default(),
        }
    }

    /// Solver for the topmost Main-layer rig of `context`, using the system's fallbacks.
    pub fn for_context(
        system: &SystemEvaluator,
        context: ContextHandle,
        params: AimSolverParams,
    ) -> CamRigResult<Self> {
        let instance = system
            .root_evaluator()
            .stack(Layer::Main)
            .entries()
            .iter()
            .rev()
            .find(|e| e.context() == context && !e.is_blending_out())
            .map(|e| e.id())
            .ok_or_else(|| {
                CamRigError::configuration(format!("context {context:?} runs no main rig"))
            })?;
        Ok(Self::new(instance, params, &system.opts().aim_solver))
    }

    /// Instance being solved.
    pub fn instance(&self) -> RigInstanceId {
        self.instance
    }

    /// Effective parameters.
    pub fn settings(&self) -> &AimSolverSettings {
        &self.settings
    }

    /// State the last run ended in.
    pub fn state(&self) -> AimSolverState {
        self.state
    }

    /// Iterations the last run performed.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Error measured by the last evaluated iteration.
    pub fn last_error(&self) -> Option<AimError> {
        self.last_error
    }

    /// Solve towards `target`. Returns `true` on `Completed` or `Corrected`.
    #[tracing::instrument(skip_all, fields(instance = self.instance.0))]
    pub fn run(&mut self, system: &mut SystemEvaluator, target: DVec3) -> bool {
        self.state = AimSolverState::Pending;
        self.iterations = 0;
        self.last_error = None;
        self.state = match self.solve(system, target) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(%err, "aim solve failed");
                AimSolverState::Failed
            }
        };
        tracing::debug!(state = ?self.state, iterations = self.iterations, "aim solve done");
        self.state.is_success()
    }

    fn solve(
        &mut self,
        system: &mut SystemEvaluator,
        target: DVec3,
    ) -> CamRigResult<AimSolverState> {
        let (arena, root, active_context) = system.solver_parts();
        let hierarchy = root.build_single_camera_rig_hierarchy(self.instance)?;
        let mut previous: Option<AimError> = None;
        let mut state = AimSolverState::Pending;

        for i in 0..self.settings.max_iterations {
            self.iterations = i + 1;

            let snapshot = root.snapshot_hierarchy(&hierarchy)?;
            self.scratch.clone_from(root.result());
            self.scratch.reset();
            if let Some(inst) = root.instance(self.instance) {
                self.scratch
                    .variable_table
                    .override_from(&inst.result().variable_table, SlotFilter::Private);
            }
            let evaluated =
                root.run_single_camera_rig(arena, &hierarchy, active_context, 0.0, &mut self.scratch);
            root.restore_hierarchy(&hierarchy, &snapshot)?;
            evaluated?;

            let pose = &self.scratch.pose;
            let location = pose.location();
            let aim_dir = pose.aim_direction();
            let target_distance = pose.target_distance();
            let to_target = target - location;
            if target_distance < self.settings.min_distance
                || to_target.length() < self.settings.min_distance
            {
                tracing::debug!(target_distance, "target too close; not turning");
                return Ok(AimSolverState::Aborted);
            }

            let err = aim_error(aim_dir, target_distance, to_target);
            self.last_error = Some(err);
            if err.angle_deg <= self.settings.angle_tolerance_deg
                || err.distance <= self.settings.distance_tolerance
            {
                return Ok(AimSolverState::Completed);
            }
            if let Some(prev) = previous {
                if !(err.angle_deg < prev.angle_deg && err.distance < prev.distance) {
                    tracing::debug!(?err, ?prev, "aim error not shrinking");
                    return Ok(AimSolverState::Aborted);
                }
            }
            previous = Some(err);

            let Some(joint) = self.scratch.joints.find(VariableId::YAW_PITCH) else {
                tracing::debug!("rig publishes no yaw/pitch joint");
                return Ok(AimSolverState::Failed);
            };
            let pivot = joint.transform.location;
            let radius = (target - pivot).length();
            let Some(l) = ray_sphere_exit(location, aim_dir, pivot, radius) else {
                tracing::debug!("line of sight misses the pivot sphere");
                return Ok(AimSolverState::Failed);
            };
            let exit = location + aim_dir * l;

            // Pivot axis assumed vertical.
            let delta =
                Rotator::from_direction(target - pivot).delta(Rotator::from_direction(exit - pivot));
            let mut op = CameraOperation::YawPitch(YawPitchOperation::new(delta.yaw, delta.pitch));
            root.broadcast_operation(&hierarchy, &mut op);
            if op.has_remaining() {
                tracing::debug!(?op, "correction not fully absorbed");
                return Ok(AimSolverState::Aborted);
            }
            state = AimSolverState::Corrected;
        }
        Ok(state)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ik/aim_solver.rs"]
mod tests;
