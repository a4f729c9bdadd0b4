use crate::foundation::error::{CamRigError, CamRigResult};
use crate::rig::transition::TransitionSpec;

/// Fallback parameters of the aim solver, used when a caller passes non-positive values.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AimSolverSettings {
    /// Angle error under which the camera counts as aimed, in degrees.
    pub angle_tolerance_deg: f64,
    /// Distance error under which the camera counts as aimed.
    pub distance_tolerance: f64,
    /// Targets (or aim distances) closer than this are refused.
    pub min_distance: f64,
    /// Iteration cap per solve.
    pub max_iterations: u32,
}

impl Default for AimSolverSettings {
    fn default() -> Self {
        Self {
            angle_tolerance_deg: 0.1,
            distance_tolerance: 1.0,
            min_distance: 100.0,
            max_iterations: 3,
        }
    }
}

/// Options controlling a [`crate::SystemEvaluator`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSystemOpts {
    /// Transition used when neither a request nor its rig carries one.
    pub default_transition: TransitionSpec,
    /// Rigs of a destroyed or removed context are dropped at once instead of blending out.
    pub immediate_deactivate_on_remove: bool,
    /// Aim solver fallbacks.
    pub aim_solver: AimSolverSettings,
}

impl Default for CameraSystemOpts {
    fn default() -> Self {
        Self {
            default_transition: TransitionSpec::default(),
            immediate_deactivate_on_remove: true,
            aim_solver: AimSolverSettings::default(),
        }
    }
}

impl CameraSystemOpts {
    /// Parse options from JSON. Missing fields keep their defaults.
    pub fn from_json_str(s: &str) -> CamRigResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| CamRigError::configuration(format!("camera system opts: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/system/opts.rs"]
mod tests;
