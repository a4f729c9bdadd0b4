use crate::foundation::core::{DVec3, Rotator, Transform3};

/// Values that can be carried by a pose property and blended.
pub(crate) trait PoseValue: Copy + PartialEq {
    fn blend(self, other: Self, alpha: f64) -> Self;
}

impl PoseValue for f64 {
    fn blend(self, other: Self, alpha: f64) -> Self {
        self + (other - self) * alpha
    }
}

impl PoseValue for DVec3 {
    fn blend(self, other: Self, alpha: f64) -> Self {
        self.lerp(other, alpha)
    }
}

impl PoseValue for Rotator {
    fn blend(self, other: Self, alpha: f64) -> Self {
        self.lerp(other, alpha)
    }
}

/// Sensor width in millimetres used to convert focal length into field of view.
pub const SENSOR_WIDTH_MM: f64 = 36.0;

macro_rules! camera_pose {
    ($( $(#[$doc:meta])* $field:ident / $setter:ident : $ty:ty = $default:expr ),* $(,)?) => {
        /// Camera pose with a per-property "changed this evaluation" flag.
        #[derive(Clone, Debug, PartialEq)]
        pub struct CameraPose {
            $( $field: $ty, )*
            changed: PoseChangedFlags,
        }

        /// Per-property changed flags of a [`CameraPose`].
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct PoseChangedFlags {
            $(
                #[doc = concat!("`", stringify!($field), "` was set this evaluation.")]
                pub $field: bool,
            )*
        }

        impl PoseChangedFlags {
            /// Return `true` when at least one property is flagged.
            pub fn any(&self) -> bool {
                false $( || self.$field )*
            }
        }

        impl Default for CameraPose {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                    changed: PoseChangedFlags::default(),
                }
            }
        }

        impl CameraPose {
            $(
                $(#[$doc])*
                pub fn $field(&self) -> $ty {
                    self.$field
                }

                #[doc = concat!("Set `", stringify!($field), "` and flag it changed.")]
                pub fn $setter(&mut self, value: $ty) {
                    self.$field = value;
                    self.changed.$field = true;
                }
            )*

            /// Current changed flags.
            pub fn changed_flags(&self) -> PoseChangedFlags {
                self.changed
            }

            /// Clear every changed flag, keeping values.
            pub fn clear_changed_flags(&mut self) {
                self.changed = PoseChangedFlags::default();
            }

            /// Copy the properties `other` flagged changed.
            pub fn override_changed(&mut self, other: &CameraPose) {
                $(
                    if other.changed.$field {
                        self.$setter(other.$field);
                    }
                )*
            }

            /// Copy every property of `other`, flagging them changed.
            pub fn override_all(&mut self, other: &CameraPose) {
                $( self.$setter(other.$field); )*
            }

            /// Interpolate every property towards `other`.
            pub fn lerp_all(&mut self, other: &CameraPose, alpha: f64) {
                $(
                    let v = PoseValue::blend(self.$field, other.$field, alpha);
                    self.$setter(v);
                )*
            }

            /// Interpolate the properties `other` flagged changed.
            pub fn lerp_changed(&mut self, other: &CameraPose, alpha: f64) {
                $(
                    if other.changed.$field {
                        let v = PoseValue::blend(self.$field, other.$field, alpha);
                        self.$setter(v);
                    }
                )*
            }
        }
    };
}

camera_pose! {
    /// World-space camera location.
    location / set_location: DVec3 = DVec3::ZERO,
    /// World-space camera orientation.
    rotation / set_rotation: Rotator = Rotator::ZERO,
    /// Distance to the point the camera is looking at.
    target_distance / set_target_distance: f64 = 1000.0,
    /// Horizontal field of view in degrees. Ignored when `focal_length` is positive.
    field_of_view / set_field_of_view: f64 = 90.0,
    /// Lens focal length in millimetres, non-positive when unset.
    focal_length / set_focal_length: f64 = -1.0,
    /// Lens aperture (f-stop).
    aperture / set_aperture: f64 = 2.8,
    /// Focus distance, non-positive when unset.
    focus_distance / set_focus_distance: f64 = -1.0,
}

impl CameraPose {
    /// Location + rotation.
    pub fn transform(&self) -> Transform3 {
        Transform3::new(self.location, self.rotation)
    }

    /// Set location and rotation together.
    pub fn set_transform(&mut self, transform: Transform3) {
        self.set_location(transform.location);
        self.set_rotation(transform.rotation);
    }

    /// Unit line-of-sight direction.
    pub fn aim_direction(&self) -> DVec3 {
        self.rotation.forward()
    }

    /// Line-of-sight endpoint: location + aim × target distance.
    pub fn target(&self) -> DVec3 {
        self.location + self.aim_direction() * self.target_distance
    }

    /// Field of view resolved from the focal length when one is set.
    pub fn effective_field_of_view(&self) -> f64 {
        if self.focal_length > 0.0 {
            (2.0 * (SENSOR_WIDTH_MM / (2.0 * self.focal_length)).atan()).to_degrees()
        } else {
            self.field_of_view
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/result/pose.rs"]
mod tests;
