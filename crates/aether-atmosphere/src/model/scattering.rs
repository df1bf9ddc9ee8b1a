use aether_math::{DVec3, Ray, intersect_sphere};

use super::AtmosphereModel;
use crate::integrator::{
    Integrator, MidpointRule, OpticalDepth, SplineRule, TaylorApproximation, TrapezoidalRule,
};
use crate::params::Options;

/// Brute-force midpoint marching on view and light rays.
pub type Midpoint = ScatteringModel<MidpointRule>;
/// Trapezoidal marching with hard planet shadows.
pub type Trapezoidal = ScatteringModel<TrapezoidalRule>;
/// Midpoint view ray with the closed-form Taylor light depth.
pub type Taylor = ScatteringModel<TaylorApproximation>;
/// Midpoint view ray with spline-table light depth.
pub type Spline = ScatteringModel<SplineRule>;

/// In-scattered light along a view ray before phase and sun intensity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScatteringSums {
    /// `Σ attenuation · ρ_R · ds`, per channel.
    pub rayleigh: DVec3,
    /// `Σ attenuation · ρ_M · ds`, per channel.
    pub mie: DVec3,
}

#[inline]
fn attenuation(options: &Options, depth: OpticalDepth) -> DVec3 {
    let tau = options.beta_rayleigh * depth.rayleigh + options.beta_mie * depth.mie;
    DVec3::new((-tau.x).exp(), (-tau.y).exp(), (-tau.z).exp())
}

/// Single-scattering sums along `ray` within `[t_min, t_max]` for light
/// arriving from `sun_direction`.
///
/// Returns `None` when the ray misses the atmosphere or the clipped segment
/// is empty. View-ray nodes whose light ray is obstructed contribute nothing.
pub fn single_scattering<I: Integrator>(
    options: &Options,
    integrator: &I,
    ray: &Ray,
    sun_direction: DVec3,
    t_min: f64,
    t_max: f64,
) -> Option<ScatteringSums> {
    let (t0, t1) = intersect_sphere(ray, options.atmosphere_radius)?;
    if t1 < 0.0 {
        return None;
    }
    let t_min = if t0 > t_min && t0 > 0.0 { t0 } else { t_min };
    let t_max = t_max.min(t1);
    if !(t_max > t_min) {
        return None;
    }

    let nodes = integrator.precompute(options, ray, t_min, t_max, integrator.view_samples());
    let mut view_depth = OpticalDepth::ZERO;
    let mut sums = ScatteringSums::default();
    for node in nodes {
        view_depth += node.depth;

        let light_ray = Ray::new(node.position, sun_direction);
        let Some((_, t_exit)) = intersect_sphere(&light_ray, options.atmosphere_radius) else {
            continue;
        };
        let Some(light_depth) = integrator.integrate(
            options,
            &light_ray,
            0.0,
            t_exit.max(0.0),
            integrator.light_samples(),
        ) else {
            continue;
        };

        let transmittance = attenuation(options, view_depth + light_depth);
        sums.rayleigh += transmittance * node.depth.rayleigh;
        sums.mie += transmittance * node.depth.mie;
    }
    Some(sums)
}

/// Atmosphere evaluated by explicit single-scattering integration with the
/// integrator `I`.
#[derive(Clone, Debug)]
pub struct ScatteringModel<I> {
    options: Options,
    integrator: I,
}

impl<I: Integrator> ScatteringModel<I> {
    pub fn new(options: Options, integrator: I) -> Self {
        Self {
            options,
            integrator,
        }
    }

    pub fn integrator(&self) -> &I {
        &self.integrator
    }
}

impl<I: Integrator> AtmosphereModel for ScatteringModel<I> {
    fn name(&self) -> &'static str {
        self.integrator.name()
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn compute_incident_light(&self, ray: &Ray, t_min: f64, t_max: f64) -> DVec3 {
        let options = &self.options;
        let Some(sums) = single_scattering(
            options,
            &self.integrator,
            ray,
            options.sun_direction,
            t_min,
            t_max,
        ) else {
            return DVec3::ZERO;
        };

        let mu = ray.direction.dot(options.sun_direction);
        let radiance = options.shade(
            sums.rayleigh * options.beta_rayleigh,
            sums.mie * options.beta_mie,
            mu,
        );
        if radiance.is_finite() { radiance.max(DVec3::ZERO) } else { DVec3::ZERO }
    }
}
