use glam::DVec3;

/// A half-line `origin + t * direction` restricted to `[t_min, t_max]`.
///
/// `valid` is cleared by cameras that cannot produce a ray for a pixel
/// (a fisheye pixel outside the image circle).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    /// Unit length.
    pub direction: DVec3,
    pub t_min: f64,
    pub t_max: f64,
    pub valid: bool,
}

impl Ray {
    /// Create an unbounded ray. `direction` is normalized here.
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            t_min: 0.0,
            t_max: f64::INFINITY,
            valid: true,
        }
    }

    /// A ray that carries no light; cameras emit it for pixels outside their image.
    pub fn invalid() -> Self {
        Self {
            origin: DVec3::ZERO,
            direction: DVec3::ZERO,
            t_min: 0.0,
            t_max: 0.0,
            valid: false,
        }
    }

    /// Copy of this ray with new parametric bounds.
    pub fn with_bounds(self, t_min: f64, t_max: f64) -> Self {
        Self {
            t_min,
            t_max,
            ..self
        }
    }

    /// Point at parameter `t`.
    #[inline]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }
}
