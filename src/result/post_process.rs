/// Optional post-process overrides carried alongside the pose.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PostProcessSettings {
    /// Exposure compensation in EV.
    #[serde(default)]
    pub exposure_bias: Option<f64>,
    /// Bloom intensity.
    #[serde(default)]
    pub bloom_intensity: Option<f64>,
    /// Vignette intensity.
    #[serde(default)]
    pub vignette_intensity: Option<f64>,
    /// Depth-of-field focal distance.
    #[serde(default)]
    pub depth_of_field_focal_distance: Option<f64>,
}

fn lerp_opt(dst: &mut Option<f64>, src: Option<f64>, alpha: f64) {
    if let Some(b) = src {
        let a = dst.unwrap_or(b);
        *dst = Some(a + (b - a) * alpha);
    }
}

impl PostProcessSettings {
    /// Return `true` when no override is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy every override set in `other`.
    pub fn override_from(&mut self, other: &PostProcessSettings) {
        self.exposure_bias = other.exposure_bias.or(self.exposure_bias);
        self.bloom_intensity = other.bloom_intensity.or(self.bloom_intensity);
        self.vignette_intensity = other.vignette_intensity.or(self.vignette_intensity);
        self.depth_of_field_focal_distance = other
            .depth_of_field_focal_distance
            .or(self.depth_of_field_focal_distance);
    }

    /// Interpolate towards every override set in `other`.
    pub fn lerp_from(&mut self, other: &PostProcessSettings, alpha: f64) {
        lerp_opt(&mut self.exposure_bias, other.exposure_bias, alpha);
        lerp_opt(&mut self.bloom_intensity, other.bloom_intensity, alpha);
        lerp_opt(&mut self.vignette_intensity, other.vignette_intensity, alpha);
        lerp_opt(
            &mut self.depth_of_field_focal_distance,
            other.depth_of_field_focal_distance,
            alpha,
        );
    }

    /// Clear every override.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
