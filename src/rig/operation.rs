/// Amounts below this are treated as fully consumed.
pub const CONSUMABLE_EPSILON: f64 = 1e-6;

/// Scalar that receivers consume piecewise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConsumableValue {
    remaining: f64,
}

impl ConsumableValue {
    /// Wrap an amount.
    pub fn new(amount: f64) -> Self {
        Self { remaining: amount }
    }

    /// Amount still available.
    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Return `true` while a non-negligible amount remains.
    pub fn has_value(&self) -> bool {
        self.remaining.abs() > CONSUMABLE_EPSILON
    }

    /// Consume up to `amount` (same sign as the remainder) and return what was taken.
    pub fn consume(&mut self, amount: f64) -> f64 {
        let taken = if self.remaining >= 0.0 {
            amount.clamp(0.0, self.remaining)
        } else {
            amount.clamp(self.remaining, 0.0)
        };
        self.remaining -= taken;
        taken
    }

    /// Consume everything.
    pub fn take(&mut self) -> f64 {
        std::mem::replace(&mut self.remaining, 0.0)
    }
}

/// Yaw/pitch correction broadcast to articulated nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YawPitchOperation {
    /// Degrees of yaw to apply.
    pub yaw: ConsumableValue,
    /// Degrees of pitch to apply.
    pub pitch: ConsumableValue,
}

impl YawPitchOperation {
    /// Operation carrying `yaw` and `pitch` degrees.
    pub fn new(yaw: f64, pitch: f64) -> Self {
        Self {
            yaw: ConsumableValue::new(yaw),
            pitch: ConsumableValue::new(pitch),
        }
    }

    /// Return `true` while some part of the delta was not absorbed.
    pub fn has_remaining(&self) -> bool {
        self.yaw.has_value() || self.pitch.has_value()
    }
}

/// Operation broadcast to operation-capable node evaluators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraOperation {
    /// Incremental yaw/pitch correction.
    YawPitch(YawPitchOperation),
}

impl CameraOperation {
    /// Return `true` while some part of the operation was not absorbed.
    pub fn has_remaining(&self) -> bool {
        match self {
            Self::YawPitch(op) => op.has_remaining(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/operation.rs"]
mod tests;
