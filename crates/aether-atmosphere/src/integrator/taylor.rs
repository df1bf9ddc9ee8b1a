//! Closed-form light-ray depth from a second-order expansion of height along
//! the ray, integrated analytically.

use aether_math::{DVec3, Ray};

use super::{Integrator, OpticalDepth};
use crate::params::Options;

/// Sentinel returned for segments that pass through the planet.
pub const OBSTRUCTED: f64 = f64::MAX;

/// Weight of the curvature term in the height expansion.
const CURVATURE_WEIGHT: f64 = 0.45;
/// Position of the expansion point between the surface and the `6H` shell.
const EXPANSION_POINT: f64 = 0.45;

/// `sign` with `sign(0) == 0`.
#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Column density ratio along a straight line in the plane of a planet of
/// radius `r`, between `x_start` and `x_stop`.
///
/// `x` is measured along the line from the point of closest approach to the
/// planet centre, `z2` is the squared closest-approach distance and `h` the
/// scale height. Returns [`OBSTRUCTED`] when the segment crosses the planet.
pub fn column_density_ratio(x_start: f64, x_stop: f64, z2: f64, r: f64, h: f64) -> f64 {
    let r2 = r * r;
    let x0 = (r2 - z2).max(0.0).sqrt();
    if x_start < x0 && -x0 < x_stop && z2 < r2 {
        return OBSTRUCTED;
    }

    // Expand around a point between the surface crossing and the 6H shell,
    // where most of the column mass sits.
    let r1 = r + 6.0 * h;
    let x1 = (r1 * r1 - z2).abs().sqrt();
    let xb = x0 + (x1 - x0) * EXPANSION_POINT;
    let rb2 = xb * xb + z2;
    let rb = rb2.sqrt();
    let d2hdx2 = z2 / (rb2 * rb2 * rb2).sqrt();
    let dhdx = xb / rb;
    let hb = rb - r;

    let height_at = |dx: f64| (0.5 * CURVATURE_WEIGHT * d2hdx2 * dx + dhdx) * dx + hb;
    let h0 = height_at(x0 - xb);
    let h_stop = height_at(x_stop.abs() - xb);
    let h_start = height_at(x_start.abs() - xb);

    let rho0 = (-h0 / h).exp();
    let side = |rho: f64| (h / dhdx * (rho0 - rho)).max(0.0);
    let sigma =
        sign(x_stop) * side((-h_stop / h).exp()) - sign(x_start) * side((-h_start / h).exp());

    if sigma.is_nan() {
        return OBSTRUCTED;
    }
    sigma.abs().min(OBSTRUCTED)
}

/// [`column_density_ratio`] for the segment `[p, p + x v]` with unit `v`.
pub fn column_density_ratio_along_ray(p: DVec3, v: DVec3, x: f64, r: f64, h: f64) -> f64 {
    let xz = -p.dot(v);
    let z2 = p.dot(p) - xz * xz;
    column_density_ratio(-xz, x - xz, z2, r, h)
}

/// Midpoint view ray, closed-form light rays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaylorApproximation {
    pub view_samples: u32,
}

impl Default for TaylorApproximation {
    fn default() -> Self {
        Self { view_samples: 1024 }
    }
}

impl TaylorApproximation {
    pub fn new(view_samples: u32) -> Self {
        Self { view_samples }
    }
}

impl Integrator for TaylorApproximation {
    fn name(&self) -> &'static str {
        "taylor"
    }

    fn view_samples(&self) -> u32 {
        self.view_samples
    }

    fn light_samples(&self) -> u32 {
        1
    }

    fn integrate(
        &self,
        options: &Options,
        ray: &Ray,
        t_start: f64,
        t_end: f64,
        _samples: u32,
    ) -> Option<OpticalDepth> {
        let p = ray.at(t_start);
        let length = t_end - t_start;
        let r = options.planet_radius;
        let rayleigh = column_density_ratio_along_ray(
            p,
            ray.direction,
            length,
            r,
            options.rayleigh_scale_height,
        );
        let mie =
            column_density_ratio_along_ray(p, ray.direction, length, r, options.mie_scale_height);
        if rayleigh >= OBSTRUCTED || mie >= OBSTRUCTED {
            return None;
        }
        Some(OpticalDepth { rayleigh, mie })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MidpointRule;
    use crate::integrator::test_support::{earth, upward_segment};

    fn compare_with_midpoint(height: f64, direction: DVec3, tolerance: f64) {
        let options = earth();
        let (ray, t_end) = upward_segment(&options, height, direction);
        let taylor = TaylorApproximation::default()
            .integrate(&options, &ray, 0.0, t_end, 1)
            .unwrap();
        let reference = MidpointRule::default()
            .integrate(&options, &ray, 0.0, t_end, 8192)
            .unwrap();
        let err_r = (taylor.rayleigh - reference.rayleigh).abs() / reference.rayleigh;
        let err_m = (taylor.mie - reference.mie).abs() / reference.mie;
        assert!(err_r < tolerance, "rayleigh error {err_r}");
        assert!(err_m < tolerance, "mie error {err_m}");
    }

    #[test]
    fn test_vertical_column() {
        compare_with_midpoint(1e-4, DVec3::Y, 0.01);
    }

    #[test]
    fn test_slanted_column() {
        let (s, c) = 60f64.to_radians().sin_cos();
        compare_with_midpoint(1e-4, DVec3::new(s, c, 0.0), 0.05);
    }

    #[test]
    fn test_blocked_by_planet() {
        let options = earth();
        let (ray, _) = upward_segment(&options, 1e-3, DVec3::new(1.0, -0.5, 0.0).normalize());
        let ratio = column_density_ratio_along_ray(
            ray.origin,
            ray.direction,
            1.0,
            options.planet_radius,
            options.rayleigh_scale_height,
        );
        assert_eq!(ratio, OBSTRUCTED);
        assert!(
            TaylorApproximation::default()
                .integrate(&options, &ray, 0.0, 1.0, 1)
                .is_none()
        );
    }

    #[test]
    fn test_tangent_at_surface_is_finite() {
        let options = earth();
        let (ray, t_end) = upward_segment(&options, 0.0, DVec3::X);
        let depth = TaylorApproximation::default()
            .integrate(&options, &ray, 0.0, t_end, 1)
            .unwrap();
        assert!(depth.is_finite());
        assert!(depth.rayleigh >= 0.0 && depth.mie >= 0.0);
    }

    #[test]
    fn test_sign_of_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(-2.0), -1.0);
    }

    #[test]
    fn test_degenerate_shell_distance_is_clamped() {
        // z² exactly on the 6H shell makes the expansion slope vanish.
        let r = 1.0;
        let h = 0.001;
        let r1 = r + 6.0 * h;
        let value = column_density_ratio(0.1, 0.2, r1 * r1, r, h);
        assert!(!value.is_nan());
        assert!(value >= 0.0);
    }
}
