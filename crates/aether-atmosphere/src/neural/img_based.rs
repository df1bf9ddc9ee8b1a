use std::f64::consts::PI;
use std::path::Path;

use aether_math::{DVec3, Ray, intersect_sphere};
use tracing::info;

use super::{DenseNetwork, check_features};
use crate::error::ModelError;
use crate::model::AtmosphereModel;
use crate::params::Options;

const INPUTS: usize = 5;
const OUTPUTS: usize = 3;
/// Upper bound on the squashed prediction so the expansion stays finite.
const MAX_SQUASHED: f64 = 0.999;

/// Network trained on rendered sky images, indexed by sun position and view
/// direction only.
#[derive(Clone, Debug)]
pub struct ImgBased {
    options: Options,
    network: DenseNetwork,
}

impl ImgBased {
    pub fn new(options: Options, network: DenseNetwork) -> Result<Self, ModelError> {
        check_features("ImgBased", &network, INPUTS, OUTPUTS)?;
        Ok(Self { options, network })
    }

    pub fn load(options: Options, path: &Path) -> Result<Self, ModelError> {
        let network = DenseNetwork::load(path)?;
        info!(
            "Loaded ImgBased network {} ({} layers)",
            path.display(),
            network.layers().len()
        );
        Self::new(options, network)
    }

    pub fn features(&self, direction: DVec3) -> [f32; INPUTS] {
        let sun = self.options.sun;
        [
            (sun.zenith / PI) as f32,
            (sun.azimuth / PI) as f32,
            direction.x as f32,
            direction.y as f32,
            direction.z as f32,
        ]
    }
}

/// Invert the `x / (10 + x)` squashing the network was trained with.
fn expand(p: f32) -> f64 {
    let p = f64::from(p);
    if !p.is_finite() {
        return 0.0;
    }
    let p = p.clamp(0.0, MAX_SQUASHED);
    10.0 * p / (1.0 - p)
}

impl AtmosphereModel for ImgBased {
    fn name(&self) -> &'static str {
        "img-based"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn compute_incident_light(&self, ray: &Ray, _t_min: f64, _t_max: f64) -> DVec3 {
        match intersect_sphere(ray, self.options.atmosphere_radius) {
            Some((_, t1)) if t1 >= 0.0 => {}
            _ => return DVec3::ZERO,
        }
        let Ok(out) = self.network.infer(&self.features(ray.direction)) else {
            return DVec3::ZERO;
        };
        DVec3::new(expand(out[0]), expand(out[1]), expand(out[2]))
    }
}
