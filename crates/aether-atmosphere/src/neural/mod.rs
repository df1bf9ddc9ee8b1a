//! Learned approximations of single scattering.
//!
//! Both models call a [`DenseNetwork`] once per ray. Their feature vectors
//! must match what the networks were trained on:
//!
//! - [`DeepAs`]: `[height / thickness, sun_angle / π, view_angle / π]`, plus
//!   `[planet_radius / r_ref, atmosphere_radius / r_ref]` in the
//!   multi-planet layout, mapped to a `(Rayleigh RGB, Mie red)` cell as in
//!   the LUT;
//! - [`ImgBased`]: `[sun_zenith / π, sun_azimuth / π, dir.x, dir.y, dir.z]`
//!   mapped to a squashed pixel colour `p`, expanded as `10 p / (1 - p)`.

mod deep_as;
mod img_based;
mod network;

use serde::{Deserialize, Serialize};

pub use deep_as::DeepAs;
pub use img_based::ImgBased;
pub use network::{Activation, DenseNetwork, Layer};

use crate::error::ModelError;
use crate::params::EARTH_RADIUS_M;

/// Input layout of a [`DeepAs`] network.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum FeatureLayout {
    /// Trained on one planet: height and the two angles.
    #[default]
    SinglePlanet,
    /// Trained across planets: the radii over `reference_radius_m` follow
    /// the angles.
    MultiPlanet { reference_radius_m: f64 },
}

impl FeatureLayout {
    /// Multi-planet layout normalised by the Earth radius.
    pub fn multi_planet() -> Self {
        FeatureLayout::MultiPlanet {
            reference_radius_m: EARTH_RADIUS_M,
        }
    }

    pub fn inputs(&self) -> usize {
        match self {
            FeatureLayout::SinglePlanet => 3,
            FeatureLayout::MultiPlanet { .. } => 5,
        }
    }
}

/// Reject a network whose input or output width differs from what `model`
/// feeds and reads.
fn check_features(
    model: &'static str,
    network: &DenseNetwork,
    expected_in: usize,
    expected_out: usize,
) -> Result<(), ModelError> {
    if network.inputs() != expected_in || network.outputs() != expected_out {
        return Err(ModelError::Features {
            model,
            expected_in,
            expected_out,
            found_in: network.inputs(),
            found_out: network.outputs(),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Activation, DenseNetwork, Layer};

    /// Single dense layer returning `bias` whatever the input.
    pub fn constant_network(inputs: usize, bias: &[f32], activation: Activation) -> DenseNetwork {
        DenseNetwork::new(vec![Layer::Dense {
            inputs,
            outputs: bias.len(),
            weights: vec![0.0; inputs * bias.len()],
            biases: bias.to_vec(),
            activation,
        }])
        .unwrap()
    }

    /// Identity-like network copying the first `outputs` inputs.
    pub fn passthrough_network(inputs: usize, outputs: usize) -> DenseNetwork {
        let mut weights = vec![0.0; inputs * outputs];
        for i in 0..outputs {
            weights[i * inputs + i] = 1.0;
        }
        DenseNetwork::new(vec![Layer::Dense {
            inputs,
            outputs,
            weights,
            biases: vec![0.0; outputs],
            activation: Activation::Linear,
        }])
        .unwrap()
    }
}
