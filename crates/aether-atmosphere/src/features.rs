//! View-ray geometry shared by the tabulated and learned models.

use aether_math::{DVec3, DVec4, Ray, intersect_sphere};

use crate::params::Options;

/// Height, sun angle and view angle of a ray at the point where it starts
/// seeing the atmosphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewGeometry {
    /// Height above the surface, clamped to `[0, thickness]`.
    pub height: f64,
    /// Angle between the local vertical and the sun direction, in `[0, π]`.
    pub sun_angle: f64,
    /// Angle between the local vertical and the view direction, in `[0, π]`.
    pub view_angle: f64,
}

impl ViewGeometry {
    /// `None` when the ray misses the atmosphere or it lies behind the
    /// origin.
    pub fn from_ray(options: &Options, ray: &Ray) -> Option<Self> {
        let (t0, t1) = intersect_sphere(ray, options.atmosphere_radius)?;
        if t1 < 0.0 {
            return None;
        }
        let point = if t0 > 0.0 { ray.at(t0) } else { ray.origin };
        let up = point.try_normalize()?;

        Some(Self {
            height: options.height(point).clamp(0.0, options.thickness()),
            sun_angle: up.dot(options.sun_direction).clamp(-1.0, 1.0).acos(),
            view_angle: up.dot(ray.direction).clamp(-1.0, 1.0).acos(),
        })
    }

    /// `[height / thickness, sun_angle / π, view_angle / π]`, each in `[0, 1]`.
    pub fn normalized(&self, options: &Options) -> [f64; 3] {
        [
            self.height / options.thickness(),
            self.sun_angle / std::f64::consts::PI,
            self.view_angle / std::f64::consts::PI,
        ]
    }
}

/// Radiance from a tabulated `(Rayleigh RGB, Mie red)` value.
///
/// The Mie colour is rebuilt from its red channel using the ratio of the
/// scattering coefficients.
pub(crate) fn shade_rgba(options: &Options, value: DVec4, mu: f64) -> DVec3 {
    let rayleigh = value.truncate();
    let beta_r = options.beta_rayleigh;
    let beta_m = options.beta_mie;
    let mie = rayleigh * value.w * beta_r.x * beta_m / (rayleigh.x * beta_m.x * beta_r + 1e-5);

    let radiance = options.shade(rayleigh, mie, mu);
    if radiance.is_finite() { radiance.max(DVec3::ZERO) } else { DVec3::ZERO }
}
