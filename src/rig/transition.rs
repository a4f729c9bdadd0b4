/// Curve mapping normalized blend progress to blend weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendCurve {
    /// Constant speed.
    Linear,
    /// Hermite `3t² - 2t³`.
    #[default]
    SmoothStep,
    /// Perlin `6t⁵ - 15t⁴ + 10t³`.
    SmootherStep,
    /// Cubic ease-in.
    EaseIn,
    /// Cubic ease-out.
    EaseOut,
}

impl BlendCurve {
    /// Weight for progress `t`, clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
            Self::SmootherStep => t * t * t * (t * (t * 6.0 - 15.0) + 10.0),
            Self::EaseIn => t * t * t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// How a rig instance blends in or out.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransitionSpec {
    /// Blend duration; zero or less is a camera cut.
    pub duration_secs: f64,
    /// Weight curve.
    #[serde(default)]
    pub curve: BlendCurve,
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self::blend(0.5, BlendCurve::SmoothStep)
    }
}

impl TransitionSpec {
    /// Instant switch.
    pub fn cut() -> Self {
        Self {
            duration_secs: 0.0,
            curve: BlendCurve::Linear,
        }
    }

    /// Timed blend.
    pub fn blend(duration_secs: f64, curve: BlendCurve) -> Self {
        Self {
            duration_secs,
            curve,
        }
    }

    /// Return `true` when this transition switches instantly.
    pub fn is_cut(&self) -> bool {
        self.duration_secs <= 0.0
    }

    /// Weight after `elapsed_secs` of blending.
    pub fn weight_at(&self, elapsed_secs: f64) -> f64 {
        if self.is_cut() {
            return 1.0;
        }
        self.curve.apply(elapsed_secs / self.duration_secs)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/transition.rs"]
mod tests;
