//! Light-ray depth from precomputed 2D spline tables.

mod bicubic;
mod cubic;
mod table;

use aether_math::{DVec3, Ray, distance_to_sphere_from};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Integrator, OpticalDepth};
use crate::params::Options;

pub use bicubic::BicubicSpline;
pub use cubic::CubicSpline;
pub use table::{Regime, SplineTable};

/// Limb clearance of the tables in meters.
const LIMB_OFFSET_M: f64 = 1000.0;
/// Distance of the extra cross-section below the upper table bound in meters.
const SECTION_OFFSET_M: f64 = 1e-7;

/// Node counts of the spline grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineGrid {
    /// Nodes along the height (or along-ray) axis.
    pub height_points: usize,
    /// Nodes along the closest-approach distance axis.
    pub distance_points: usize,
}

impl Default for SplineGrid {
    fn default() -> Self {
        Self {
            height_points: 50,
            distance_points: 20,
        }
    }
}

/// Midpoint view ray, spline-table light rays.
///
/// Building the four tables (Rayleigh and Mie, above and below the limb) is
/// the expensive part; queries are a binary search and two antiderivative
/// evaluations per table.
#[derive(Clone, Debug)]
pub struct SplineRule {
    pub view_samples: u32,
    offset: f64,
    rayleigh_above: SplineTable,
    rayleigh_below: SplineTable,
    mie_above: SplineTable,
    mie_below: SplineTable,
}

impl SplineRule {
    pub fn new(options: &Options, view_samples: u32, grid: SplineGrid) -> Self {
        let offset = options.scale_length(LIMB_OFFSET_M);
        let section_offset = options.scale_length(SECTION_OFFSET_M);
        let build = |regime, scale_height| {
            SplineTable::build(
                regime,
                scale_height,
                options.planet_radius,
                options.atmosphere_radius,
                offset,
                section_offset,
                grid,
            )
        };

        info!(
            height_points = grid.height_points,
            distance_points = grid.distance_points,
            view_samples,
            "building spline tables"
        );

        Self {
            view_samples,
            offset,
            rayleigh_above: build(Regime::Above, options.rayleigh_scale_height),
            rayleigh_below: build(Regime::Below, options.rayleigh_scale_height),
            mie_above: build(Regime::Above, options.mie_scale_height),
            mie_below: build(Regime::Below, options.mie_scale_height),
        }
    }

    /// Column density between `pa` and `pe` on a line with unit `direction`.
    pub fn column_depth(
        &self,
        options: &Options,
        pa: DVec3,
        pe: DVec3,
        direction: DVec3,
    ) -> OpticalDepth {
        let thickness = options.thickness();
        let pa_distance = pa.length();
        let pe_distance = pe.length();
        let pa_height = (pa_distance - options.planet_radius).clamp(0.0, thickness);
        let pe_height = (pe_distance - options.planet_radius).clamp(0.0, thickness);
        let ray_distance = pa.cross(direction).length();

        if ray_distance < options.planet_radius - self.offset {
            return OpticalDepth {
                rayleigh: self.rayleigh_below.integral(pa_height, pe_height, ray_distance),
                mie: self.mie_below.integral(pa_height, pe_height, ray_distance),
            };
        }

        let length = (pe - pa).length();
        let moving_outwards =
            pe_distance * pe_distance - length * length - pa_distance * pa_distance > 0.0;
        let across = |table: &SplineTable| {
            if moving_outwards {
                table.integral(pa_height, pe_height, ray_distance)
            } else {
                // Down to the closest approach and back up, then the rest.
                let ray_height = ray_distance - options.planet_radius;
                let lower = pa_height.min(pe_height);
                let higher = pa_height.max(pe_height);
                2.0 * table.integral(ray_height, lower, ray_distance)
                    + table.integral(lower, higher, ray_distance)
            }
        };
        OpticalDepth {
            rayleigh: across(&self.rayleigh_above),
            mie: across(&self.mie_above),
        }
    }
}

impl Integrator for SplineRule {
    fn name(&self) -> &'static str {
        "spline"
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
        let pa = ray.at(t_start);
        let to_ground = distance_to_sphere_from(pa, ray.direction, options.planet_radius);
        let to_top = distance_to_sphere_from(pa, ray.direction, options.atmosphere_radius);
        if to_ground > 0.0 || to_top < 0.0 {
            return None;
        }
        let depth = self.column_depth(options, pa, ray.at(t_end), ray.direction);
        depth.is_finite().then_some(depth)
    }
}
