//! Optical-depth integrators.
//!
//! An integrator evaluates the Rayleigh and Mie column densities along a ray
//! segment `[t_start, t_end]` in two modes:
//!
//! - [`Integrator::precompute`] returns one [`IntegrationData`] per quadrature
//!   node, so the caller can attenuate every node individually (view rays);
//! - [`Integrator::integrate`] returns the aggregated depth of the whole
//!   segment, or `None` when the planet blocks the segment (light rays).

mod midpoint;
mod spline;
mod taylor;
mod trapezoidal;

use std::ops::{Add, AddAssign, Mul};

use aether_math::{DVec3, Ray};

use crate::params::Options;

pub use midpoint::{MidpointRule, midpoint_samples};
pub use spline::{BicubicSpline, CubicSpline, Regime, SplineGrid, SplineRule, SplineTable};
pub use taylor::{
    OBSTRUCTED, TaylorApproximation, column_density_ratio, column_density_ratio_along_ray,
};
pub use trapezoidal::TrapezoidalRule;

/// Density-weighted path length for the two scatterer populations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OpticalDepth {
    pub rayleigh: f64,
    pub mie: f64,
}

impl OpticalDepth {
    pub const ZERO: Self = Self {
        rayleigh: 0.0,
        mie: 0.0,
    };

    pub fn is_finite(&self) -> bool {
        self.rayleigh.is_finite() && self.mie.is_finite()
    }
}

impl Add for OpticalDepth {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            rayleigh: self.rayleigh + rhs.rayleigh,
            mie: self.mie + rhs.mie,
        }
    }
}

impl AddAssign for OpticalDepth {
    fn add_assign(&mut self, rhs: Self) {
        self.rayleigh += rhs.rayleigh;
        self.mie += rhs.mie;
    }
}

impl Mul<f64> for OpticalDepth {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self {
            rayleigh: self.rayleigh * rhs,
            mie: self.mie * rhs,
        }
    }
}

/// One quadrature node of a view ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegrationData {
    pub position: DVec3,
    /// Contribution of this node, quadrature weight included.
    pub depth: OpticalDepth,
}

/// Strategy for evaluating optical depth along rays.
pub trait Integrator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Quadrature nodes used on view rays.
    fn view_samples(&self) -> u32;

    /// Quadrature nodes used on light rays (ignored by closed forms).
    fn light_samples(&self) -> u32;

    /// Per-node contributions along `[t_start, t_end]`.
    ///
    /// The default is the midpoint rule, which the closed-form light
    /// integrators use for the view ray.
    fn precompute(
        &self,
        options: &Options,
        ray: &Ray,
        t_start: f64,
        t_end: f64,
        samples: u32,
    ) -> Vec<IntegrationData> {
        midpoint_samples(options, ray, t_start, t_end, samples)
    }

    /// Total depth along `[t_start, t_end]`, `None` if the segment is
    /// obstructed by the planet.
    fn integrate(
        &self,
        options: &Options,
        ray: &Ray,
        t_start: f64,
        t_end: f64,
        samples: u32,
    ) -> Option<OpticalDepth>;
}
