use std::path::Path;

use aether_math::{DVec3, DVec4, Ray};
use tracing::info;

use super::{DenseNetwork, FeatureLayout, check_features};
use crate::error::ModelError;
use crate::features::{ViewGeometry, shade_rgba};
use crate::model::AtmosphereModel;
use crate::params::Options;

const OUTPUTS: usize = 4;

/// Network trained to reproduce the single-scattering LUT.
#[derive(Clone, Debug)]
pub struct DeepAs {
    options: Options,
    network: DenseNetwork,
    layout: FeatureLayout,
}

impl DeepAs {
    pub fn new(
        options: Options,
        network: DenseNetwork,
        layout: FeatureLayout,
    ) -> Result<Self, ModelError> {
        check_features("DeepAS", &network, layout.inputs(), OUTPUTS)?;
        Ok(Self {
            options,
            network,
            layout,
        })
    }

    pub fn load(options: Options, path: &Path, layout: FeatureLayout) -> Result<Self, ModelError> {
        let network = DenseNetwork::load(path)?;
        info!(
            "Loaded DeepAS network {} ({} layers, {:?})",
            path.display(),
            network.layers().len(),
            layout
        );
        Self::new(options, network, layout)
    }

    /// Input vector for `geometry`, in the order the network was trained on.
    pub fn features(&self, geometry: &ViewGeometry) -> Vec<f32> {
        let options = &self.options;
        let mut features: Vec<f32> = geometry
            .normalized(options)
            .iter()
            .map(|&x| x as f32)
            .collect();
        if let FeatureLayout::MultiPlanet { reference_radius_m } = self.layout {
            let reference = options.scale_length(reference_radius_m);
            features.push((options.planet_radius / reference) as f32);
            features.push((options.atmosphere_radius / reference) as f32);
        }
        features
    }
}

impl AtmosphereModel for DeepAs {
    fn name(&self) -> &'static str {
        "deep-as"
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn compute_incident_light(&self, ray: &Ray, _t_min: f64, _t_max: f64) -> DVec3 {
        let Some(geometry) = ViewGeometry::from_ray(&self.options, ray) else {
            return DVec3::ZERO;
        };
        let Ok(out) = self.network.infer(&self.features(&geometry)) else {
            return DVec3::ZERO;
        };
        let value = DVec4::new(
            f64::from(out[0]),
            f64::from(out[1]),
            f64::from(out[2]),
            f64::from(out[3]),
        );
        let mu = ray.direction.dot(self.options.sun_direction);
        shade_rgba(&self.options, value, mu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::test_support::earth;
    use crate::neural::test_support::{constant_network, passthrough_network};
    use crate::neural::Activation;

    fn sea_level_ray() -> Ray {
        Ray::new(DVec3::new(0.0, earth().planet_radius, 0.0), DVec3::Y)
    }

    #[test]
    fn test_rejects_wrong_feature_count() {
        let three_in = constant_network(3, &[0.1; 4], Activation::Linear);
        assert!(matches!(
            DeepAs::new(earth(), three_in, FeatureLayout::multi_planet()),
            Err(ModelError::Features {
                expected_in: 5,
                found_in: 3,
                ..
            })
        ));

        let three_out = constant_network(3, &[0.1; 3], Activation::Linear);
        assert!(matches!(
            DeepAs::new(earth(), three_out, FeatureLayout::SinglePlanet),
            Err(ModelError::Features { found_out: 3, .. })
        ));
    }

    #[test]
    fn test_features_follow_training_layout() {
        let options = earth();
        let network = passthrough_network(5, 4);
        let model = DeepAs::new(options.clone(), network, FeatureLayout::multi_planet()).unwrap();
        let geometry = ViewGeometry {
            height: options.thickness() / 2.0,
            sun_angle: std::f64::consts::FRAC_PI_4,
            view_angle: std::f64::consts::PI,
        };
        let features = model.features(&geometry);
        assert_eq!(features.len(), 5);
        assert!((features[0] - 0.5).abs() < 1e-6);
        assert!((features[1] - 0.25).abs() < 1e-6);
        assert!((features[2] - 1.0).abs() < 1e-6);
        assert!((features[3] - 1.0).abs() < 1e-6);
        assert!((features[4] - 6420.0 / 6360.0).abs() < 1e-6);
    }

    #[test]
    fn test_constant_network_shades_like_lut() {
        let options = earth();
        let cell = [0.02f32, 0.05, 0.1, 0.03];
        let model = DeepAs::new(
            options.clone(),
            constant_network(3, &cell, Activation::Linear),
            FeatureLayout::SinglePlanet,
        )
        .unwrap();
        let value = DVec4::new(
            f64::from(cell[0]),
            f64::from(cell[1]),
            f64::from(cell[2]),
            f64::from(cell[3]),
        );
        let expected = shade_rgba(&options, value, 1.0);
        let color = model.compute_incident_light(&sea_level_ray(), 0.0, f64::INFINITY);
        assert!((color - expected).length() < 1e-12);
        assert!(color.min_element() > 0.0);
    }

    #[test]
    fn test_miss_is_black() {
        let options = earth();
        let model = DeepAs::new(
            options.clone(),
            constant_network(3, &[1.0; 4], Activation::Relu),
            FeatureLayout::SinglePlanet,
        )
        .unwrap();
        let origin = DVec3::new(0.0, options.atmosphere_radius * 3.0, 0.0);
        let ray = Ray::new(origin, DVec3::Y);
        assert_eq!(model.compute_incident_light(&ray, 0.0, f64::INFINITY), DVec3::ZERO);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep_as.bin");
        constant_network(3, &[0.1; 4], Activation::Relu)
            .save(&path)
            .unwrap();
        let model = DeepAs::load(earth(), &path, FeatureLayout::SinglePlanet).unwrap();
        assert_eq!(model.name(), "deep-as");
        let missing = dir.path().join("nope.bin");
        assert!(DeepAs::load(earth(), &missing, FeatureLayout::SinglePlanet).is_err());
    }
}
