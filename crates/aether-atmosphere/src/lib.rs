//! Single-scattering sky radiance: planet parameters, phase functions,
//! optical-depth integrators and the interchangeable atmosphere models
//! (ray marching, Taylor closed form, spline tables, a tabulated LUT and
//! neural surrogates).
//!
//! Every model implements [`AtmosphereModel`]. Models are immutable once
//! built and are shared by reference across render threads.

mod error;
mod features;
pub mod integrator;
pub mod lut;
mod model;
pub mod neural;
mod params;
mod phase;

pub use error::{LutError, ModelError, ParamsError};
pub use features::ViewGeometry;
pub use integrator::{
    IntegrationData, Integrator, MidpointRule, OpticalDepth, SplineGrid, SplineRule,
    TaylorApproximation, TrapezoidalRule,
};
pub use lut::{LutDims, PrecomputedSs, ScatteringLut};
pub use model::{
    AtmosphereModel, Midpoint, ScatteringModel, ScatteringSums, Spline, Taylor, Trapezoidal,
    single_scattering,
};
pub use neural::{DeepAs, DenseNetwork, FeatureLayout, ImgBased};
pub use params::{Options, PlanetParams, PlanetPreset, Shell, Sun};
pub use phase::{MiePhase, rayleigh_phase};
