use crate::result::allocation::AllocationInfo;
use crate::result::joints::CameraRigJoints;
use crate::result::pose::CameraPose;
use crate::result::post_process::PostProcessSettings;
use crate::result::table::{DataTable, SlotFilter, VariableTable};

/// Aggregate output of one camera evaluation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluationResult {
    /// Camera pose.
    pub pose: CameraPose,
    /// Typed variables.
    pub variable_table: VariableTable,
    /// Named blobs.
    pub data_table: DataTable,
    /// Pivots published by rig nodes.
    pub joints: CameraRigJoints,
    /// Post-process overrides.
    pub post_process: PostProcessSettings,
    /// This evaluation does not continue the previous one.
    pub is_camera_cut: bool,
    /// Something produced a pose this evaluation.
    pub is_valid: bool,
}

impl EvaluationResult {
    /// Result with tables allocated from `info`.
    pub fn new(info: &AllocationInfo) -> Self {
        let mut result = Self::default();
        result.allocate(info);
        result
    }

    /// Allocate the slots described by `info` that are missing.
    pub fn allocate(&mut self, info: &AllocationInfo) {
        self.variable_table.allocate(info);
        self.data_table.allocate(info);
    }

    /// Clear per-frame flags: pose changes, `written_this_frame`, camera cut.
    pub fn reset_frame_flags(&mut self) {
        self.pose.clear_changed_flags();
        self.variable_table.clear_written_this_frame_flags();
        self.data_table.clear_written_this_frame_flags();
        self.is_camera_cut = false;
    }

    /// Revert auto-reset slots.
    pub fn auto_reset(&mut self) {
        self.variable_table.auto_reset_values();
        self.data_table.auto_reset_values();
    }

    /// End-of-frame housekeeping.
    pub fn on_end_of_frame(&mut self) {
        self.reset_frame_flags();
        self.auto_reset();
    }

    /// Restore a freshly allocated state, keeping the layout.
    pub fn reset(&mut self) {
        self.pose = CameraPose::default();
        self.variable_table.reset_all();
        self.data_table.reset_all();
        self.joints.reset();
        self.post_process.reset();
        self.is_camera_cut = false;
        self.is_valid = false;
    }

    /// Overlay what `other` changed or wrote on top of `self`.
    pub fn override_changed(&mut self, other: &EvaluationResult) {
        self.pose.override_changed(&other.pose);
        self.variable_table
            .override_from(&other.variable_table, SlotFilter::All);
        self.data_table.override_from(&other.data_table, SlotFilter::All);
        self.joints.override_from(&other.joints);
        self.post_process.override_from(&other.post_process);
        self.is_camera_cut |= other.is_camera_cut;
        self.is_valid |= other.is_valid;
    }

    /// Blend `self` towards `other` by `alpha`; `alpha >= 1` replaces the whole pose.
    pub fn lerp_from(&mut self, other: &EvaluationResult, alpha: f64) {
        if alpha >= 1.0 {
            self.pose.override_all(&other.pose);
        } else {
            self.pose.lerp_all(&other.pose, alpha);
        }
        self.variable_table
            .lerp_from(&other.variable_table, SlotFilter::All, alpha);
        self.data_table
            .lerp_from(&other.data_table, SlotFilter::All, alpha);
        if alpha >= 0.5 {
            self.joints.override_from(&other.joints);
        }
        self.post_process.lerp_from(&other.post_process, alpha);
        if alpha >= 1.0 {
            self.is_camera_cut |= other.is_camera_cut;
        }
        self.is_valid |= other.is_valid;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/result/evaluation_result.rs"]
mod tests;
