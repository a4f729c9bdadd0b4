use crate::foundation::core::DVec3;
use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x6361_6d72_6967_0001;

/// Discriminants within this band of zero are treated as a tangent ray.
pub(crate) const TANGENT_EPSILON: f64 = 1e-6;

/// Seeded xxh3 hasher producing stable 64-bit ids.
pub(crate) struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    pub(crate) fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    pub(crate) fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_str(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.write_bytes(s.as_bytes());
    }

    pub(crate) fn finish(self) -> u64 {
        self.inner.digest()
    }
}

/// Distance along a ray at which it leaves a sphere.
///
/// Solves `a·L² + b·L + c = 0` and keeps the larger root. A negative discriminant has
/// no solution; a tangent ray (discriminant within [`TANGENT_EPSILON`] of zero) only
/// succeeds when its single root is not behind the ray start.
pub fn ray_sphere_exit(
    ray_start: DVec3,
    ray_dir: DVec3,
    sphere_origin: DVec3,
    radius: f64,
) -> Option<f64> {
    let a = ray_dir.dot(ray_dir);
    if a <= f64::EPSILON {
        return None;
    }
    let to_start = ray_start - sphere_origin;
    let b = 2.0 * ray_dir.dot(to_start);
    let c = to_start.dot(to_start) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant.abs() <= TANGENT_EPSILON {
        let l = -b / (2.0 * a);
        return (l >= 0.0).then_some(l);
    }
    if discriminant < 0.0 {
        return None;
    }
    // a > 0, so the `+` root is the larger one.
    Some((-b + discriminant.sqrt()) / (2.0 * a))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
