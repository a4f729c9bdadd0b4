use std::ops::{Add, Neg, Sub};

pub use glam::{DQuat, DVec3};

/// Orientation as pitch/yaw/roll in degrees.
///
/// World convention: X forward, Y right, Z up. Positive pitch looks up, positive yaw
/// turns from +X towards +Y.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rotator {
    /// Rotation around the right axis, degrees.
    pub pitch: f64,
    /// Rotation around the up axis, degrees.
    pub yaw: f64,
    /// Rotation around the forward axis, degrees.
    pub roll: f64,
}

impl Rotator {
    /// Identity rotation.
    pub const ZERO: Self = Self {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    /// Construct from pitch, yaw and roll in degrees.
    pub fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Rotation whose forward axis points along `dir`. Roll is zero.
    ///
    /// A zero vector yields [`Rotator::ZERO`].
    pub fn from_direction(dir: DVec3) -> Self {
        if dir.length_squared() <= f64::EPSILON {
            return Self::ZERO;
        }
        let yaw = dir.y.atan2(dir.x).to_degrees();
        let pitch = dir.z.atan2(dir.x.hypot(dir.y)).to_degrees();
        Self::new(pitch, yaw, 0.0)
    }

    /// Unit forward vector.
    pub fn forward(self) -> DVec3 {
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        DVec3::new(cp * cy, cp * sy, sp)
    }

    /// Quaternion equivalent (yaw, then pitch, then roll applied to a local vector).
    pub fn to_quat(self) -> DQuat {
        DQuat::from_rotation_z(self.yaw.to_radians())
            * DQuat::from_rotation_y(-self.pitch.to_radians())
            * DQuat::from_rotation_x(self.roll.to_radians())
    }

    /// Rotate a vector expressed in this rotation's local space into world space.
    pub fn rotate_vector(self, v: DVec3) -> DVec3 {
        self.to_quat() * v
    }

    /// Every axis wrapped into `(-180, 180]`.
    pub fn normalized(self) -> Self {
        Self::new(
            normalize_axis(self.pitch),
            normalize_axis(self.yaw),
            normalize_axis(self.roll),
        )
    }

    /// Shortest-path per-axis difference `self - other`.
    pub fn delta(self, other: Self) -> Self {
        (self - other).normalized()
    }

    /// Shortest-path per-axis interpolation towards `other`.
    pub fn lerp(self, other: Self, alpha: f64) -> Self {
        let d = other.delta(self);
        Self::new(
            self.pitch + d.pitch * alpha,
            self.yaw + d.yaw * alpha,
            self.roll + d.roll * alpha,
        )
        .normalized()
    }

    /// Return `true` when every axis is within `tolerance` degrees of `other`.
    pub fn approx_eq(self, other: Self, tolerance: f64) -> bool {
        let d = self.delta(other);
        d.pitch.abs() <= tolerance && d.yaw.abs() <= tolerance && d.roll.abs() <= tolerance
    }
}

impl Add for Rotator {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.pitch + rhs.pitch,
            self.yaw + rhs.yaw,
            self.roll + rhs.roll,
        )
    }
}

impl Sub for Rotator {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.pitch - rhs.pitch,
            self.yaw - rhs.yaw,
            self.roll - rhs.roll,
        )
    }
}

impl Neg for Rotator {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.pitch, -self.yaw, -self.roll)
    }
}

/// Wrap an angle in degrees into `(-180, 180]`.
pub fn normalize_axis(deg: f64) -> f64 {
    let mut a = deg % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

/// Location + rotation pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform3 {
    /// World-space location.
    pub location: DVec3,
    /// World-space orientation.
    pub rotation: Rotator,
}

impl Transform3 {
    /// Construct from parts.
    pub fn new(location: DVec3, rotation: Rotator) -> Self {
        Self { location, rotation }
    }

    /// Transform a point from local space into world space.
    pub fn transform_point(self, local: DVec3) -> DVec3 {
        self.location + self.rotation.rotate_vector(local)
    }

    /// Interpolate location linearly and rotation along the shortest path.
    pub fn lerp(self, other: Self, alpha: f64) -> Self {
        Self {
            location: self.location.lerp(other.location, alpha),
            rotation: self.rotation.lerp(other.rotation, alpha),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
