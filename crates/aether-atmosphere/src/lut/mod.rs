//! Tabulated single scattering.
//!
//! [`ScatteringLut`] stores `(Rayleigh RGB, Mie red)` in-scattering for a
//! regular grid of height, sun angle and view angle, evaluated with the
//! midpoint integrator in a plane through the pole. [`PrecomputedSs`] looks
//! rays up by trilinear interpolation and applies the phase functions at
//! query time, so the table ignores the sun/view azimuth difference.

mod atof;
mod format;

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use aether_math::{DVec3, DVec4, Ray, intersect_sphere};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::LutError;
use crate::features::{ViewGeometry, shade_rgba};
use crate::integrator::MidpointRule;
use crate::model::{AtmosphereModel, single_scattering};
use crate::params::{EARTH_RADIUS_M, Options};

pub use atof::fast_atof;

/// Grid resolution of a LUT.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LutDims {
    pub heights: usize,
    pub sun_angles: usize,
    pub view_angles: usize,
}

impl Default for LutDims {
    fn default() -> Self {
        Self {
            heights: 32,
            sun_angles: 32,
            view_angles: 32,
        }
    }
}

impl LutDims {
    /// Number of cells.
    pub fn len(&self) -> usize {
        self.heights * self.sun_angles * self.view_angles
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Position of grid index `i` in `[0, 1]`.
fn fraction(i: usize, n: usize) -> f64 {
    if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 }
}

/// Bracketing indices and blend weight for normalised coordinate `x`.
fn axis(x: f64, n: usize) -> (usize, usize, f64) {
    if n <= 1 || !x.is_finite() {
        return (0, 0, 0.0);
    }
    let f = x.clamp(0.0, 1.0) * (n - 1) as f64;
    let i0 = (f.floor() as usize).min(n - 2);
    (i0, i0 + 1, f - i0 as f64)
}

/// Single-scattering table, immutable once built or loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct ScatteringLut {
    dims: LutDims,
    /// Indexed `(ih * Ns + is) * Nv + iv`.
    cells: Vec<DVec4>,
    /// Planet and atmosphere radii over the scaled Earth radius.
    radii: (f64, f64),
}

impl ScatteringLut {
    /// Table with no cells. Lookups return zero.
    pub fn empty() -> Self {
        Self {
            dims: LutDims {
                heights: 0,
                sun_angles: 0,
                view_angles: 0,
            },
            cells: Vec::new(),
            radii: (0.0, 0.0),
        }
    }

    fn from_parts(dims: LutDims, cells: Vec<DVec4>, radii: (f64, f64)) -> Self {
        debug_assert_eq!(cells.len(), dims.len());
        Self { dims, cells, radii }
    }

    /// Fill every cell by midpoint integration of a synthetic ray.
    pub fn build(options: &Options, integrator: &MidpointRule, dims: LutDims) -> Self {
        info!(
            heights = dims.heights,
            sun_angles = dims.sun_angles,
            view_angles = dims.view_angles,
            "Precomputing single-scattering LUT"
        );
        let mut cells = Vec::with_capacity(dims.len());
        for ih in 0..dims.heights {
            let height = options.planet_radius + options.thickness() * fraction(ih, dims.heights);
            let origin = DVec3::new(0.0, height, 0.0);
            for is in 0..dims.sun_angles {
                let sun_angle = std::f64::consts::PI * fraction(is, dims.sun_angles);
                let (sin_s, cos_s) = sun_angle.sin_cos();
                let sun = DVec3::new(sin_s, cos_s, 0.0);
                for iv in 0..dims.view_angles {
                    let (sin_v, cos_v) =
                        (std::f64::consts::PI * fraction(iv, dims.view_angles)).sin_cos();
                    let ray = Ray::new(origin, DVec3::new(sin_v, cos_v, 0.0));
                    cells.push(cell_value(options, integrator, &ray, sun));
                }
            }
            info!("LUT height slice {}/{}", ih + 1, dims.heights);
        }

        let reference = options.scale_length(EARTH_RADIUS_M);
        Self::from_parts(
            dims,
            cells,
            (
                options.planet_radius / reference,
                options.atmosphere_radius / reference,
            ),
        )
    }

    pub fn dims(&self) -> LutDims {
        self.dims
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Planet and atmosphere radii the table was built for, over the scaled
    /// Earth radius.
    pub fn normalized_radii(&self) -> (f64, f64) {
        self.radii
    }

    pub fn cells(&self) -> &[DVec4] {
        &self.cells
    }

    #[inline]
    pub fn cell(&self, ih: usize, is: usize, iv: usize) -> DVec4 {
        let dims = self.dims;
        self.cells[(ih * dims.sun_angles + is) * dims.view_angles + iv]
    }

    /// Trilinear lookup at normalised height, sun angle and view angle,
    /// each clamped to `[0, 1]`.
    pub fn sample(&self, height: f64, sun_angle: f64, view_angle: f64) -> DVec4 {
        if self.is_empty() {
            return DVec4::ZERO;
        }
        let (h0, h1, th) = axis(height, self.dims.heights);
        let (s0, s1, ts) = axis(sun_angle, self.dims.sun_angles);
        let (v0, v1, tv) = axis(view_angle, self.dims.view_angles);

        let lerp_v = |ih, is| self.cell(ih, is, v0).lerp(self.cell(ih, is, v1), tv);
        let lerp_sv = |ih| lerp_v(ih, s0).lerp(lerp_v(ih, s1), ts);
        lerp_sv(h0).lerp(lerp_sv(h1), th)
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        format::write_lut(self, out)
    }

    /// Parse the text format. The header dimensions are authoritative.
    pub fn parse(text: &str) -> Result<Self, LutError> {
        format::parse_lut(text)
    }

    pub fn save(&self, path: &Path) -> Result<(), LutError> {
        let io_error = |source| LutError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = fs::File::create(path).map_err(io_error)?;
        let mut out = BufWriter::new(file);
        self.write_to(&mut out).map_err(io_error)?;
        out.flush().map_err(io_error)?;
        info!("Saved LUT to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, LutError> {
        let text = fs::read_to_string(path).map_err(|source| LutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lut = Self::parse(&text)?;
        info!(
            "Loaded LUT {} ({}x{}x{})",
            path.display(),
            lut.dims.heights,
            lut.dims.sun_angles,
            lut.dims.view_angles
        );
        Ok(lut)
    }

    /// Load `path` if it holds a valid table, otherwise build one and try to
    /// save it there.
    pub fn load_or_build(
        path: &Path,
        options: &Options,
        integrator: &MidpointRule,
        dims: LutDims,
    ) -> Self {
        if path.exists() {
            match Self::load(path) {
                Ok(lut) => {
                    if lut.dims != dims {
                        warn!(
                            "LUT {} is {:?}, requested {:?}; using the file",
                            path.display(),
                            lut.dims,
                            dims
                        );
                    }
                    return lut;
                }
                Err(e) => warn!("Failed to load LUT: {e}; rebuilding"),
            }
        }

        let lut = Self::build(options, integrator, dims);
        if let Err(e) = lut.save(path) {
            warn!("Failed to save LUT: {e}");
        }
        lut
    }
}

fn cell_value(options: &Options, integrator: &MidpointRule, ray: &Ray, sun: DVec3) -> DVec4 {
    let t_max = match intersect_sphere(ray, options.planet_radius) {
        Some((t0, t1)) if t1 > 0.0 => t0.max(0.0),
        _ => f64::INFINITY,
    };
    let Some(sums) = single_scattering(options, integrator, ray, sun, 0.0, t_max) else {
        return DVec4::ZERO;
    };
    let rayleigh = sums.rayleigh * options.beta_rayleigh;
    let mie = sums.mie.x * options.beta_mie.x;
    let value = rayleigh.extend(mie);
    if value.is_finite() { value } else { DVec4::ZERO }
}

/// Atmosphere answered from a [`ScatteringLut`].
#[derive(Debug)]
pub struct PrecomputedSs {
    options: Options,
    lut: ScatteringLut,
    warned_empty: AtomicBool,
}

impl PrecomputedSs {
    pub fn new(options: Options, lut: ScatteringLut) -> Self {
        if !lut.is_empty() {
            let reference = options.scale_length(EARTH_RADIUS_M);
            let expected = (
                options.planet_radius / reference,
                options.atmosphere_radius / reference,
            );
            let (planet, atmosphere) = lut.normalized_radii();
            if (planet - expected.0).abs() > 1e-6 || (atmosphere - expected.1).abs() > 1e-6 {
                warn!(
                    "LUT was built for radii ({planet}, {atmosphere}), atmosphere has ({}, {})",
                    expected.0, expected.1
                );
            }
        }
        Self {
            options,
            lut,
            warned_empty: AtomicBool::new(false),
        }
    }

    pub fn lut(&self) -> &ScatteringLut {
        &self.lut
    }
}

impl AtmosphereModel for PrecomputedSs {
    fn name(&self) -> &'static str {
        "precomputed-ss"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    /// Ground clipping is baked into the table, so `t_min` and `t_max` are
    /// not used.
    fn compute_incident_light(&self, ray: &Ray, _t_min: f64, _t_max: f64) -> DVec3 {
        if self.lut.is_empty() {
            if !self.warned_empty.swap(true, Ordering::Relaxed) {
                warn!("Single-scattering LUT is empty; returning black");
            }
            return DVec3::ZERO;
        }
        let Some(geometry) = ViewGeometry::from_ray(&self.options, ray) else {
            return DVec3::ZERO;
        };
        let [height, sun_angle, view_angle] = geometry.normalized(&self.options);
        let value = self.lut.sample(height, sun_angle, view_angle);
        let mu = ray.direction.dot(self.options.sun_direction);
        shade_rgba(&self.options, value, mu)
    }
}
