//! The atmosphere model abstraction shared by every evaluation strategy.

mod scattering;

use aether_math::{DVec3, Ray, intersect_sphere};

use crate::params::{Options, Shell};

pub use scattering::{
    Midpoint, ScatteringModel, ScatteringSums, Spline, Taylor, Trapezoidal, single_scattering,
};

/// Radiance along camera rays through a planetary atmosphere.
///
/// Implementations are immutable after construction and are shared across
/// render threads by reference.
pub trait AtmosphereModel: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn options(&self) -> &Options;

    /// Entry and exit distances of `ray` through `shell`, `t0 <= t1`.
    fn intersect(&self, ray: &Ray, shell: Shell) -> Option<(f64, f64)> {
        intersect_sphere(ray, self.options().radius(shell))
    }

    /// RGB radiance scattered towards the ray origin along `[t_min, t_max]`.
    ///
    /// Always finite and non-negative. Rays that miss the atmosphere return
    /// zero.
    fn compute_incident_light(&self, ray: &Ray, t_min: f64, t_max: f64) -> DVec3;
}
