use aether_math::Ray;

use super::{IntegrationData, Integrator, OpticalDepth};
use crate::params::Options;

/// Midpoint nodes `t_start + step * (i + 0.5)` weighted by `step`.
pub fn midpoint_samples(
    options: &Options,
    ray: &Ray,
    t_start: f64,
    t_end: f64,
    samples: u32,
) -> Vec<IntegrationData> {
    let samples = samples.max(1);
    let step = (t_end - t_start) / samples as f64;
    (0..samples)
        .map(|i| {
            let position = ray.at(t_start + step * (i as f64 + 0.5));
            IntegrationData {
                position,
                depth: options.density(options.height(position)) * step,
            }
        })
        .collect()
}

/// Brute-force ray marching with the composite midpoint rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MidpointRule {
    pub view_samples: u32,
    pub light_samples: u32,
}

impl Default for MidpointRule {
    fn default() -> Self {
        Self {
            view_samples: 16,
            light_samples: 8,
        }
    }
}

impl MidpointRule {
    pub fn new(view_samples: u32, light_samples: u32) -> Self {
        Self {
            view_samples,
            light_samples,
        }
    }
}

impl Integrator for MidpointRule {
    fn name(&self) -> &'static str {
        "midpoint"
    }

    fn view_samples(&self) -> u32 {
        self.view_samples
    }

    fn light_samples(&self) -> u32 {
        self.light_samples
    }

    fn integrate(
        &self,
        options: &Options,
        ray: &Ray,
        t_start: f64,
        t_end: f64,
        samples: u32,
    ) -> Option<OpticalDepth> {
        let samples = samples.max(1);
        let step = (t_end - t_start) / samples as f64;
        let mut depth = OpticalDepth::ZERO;
        for i in 0..samples {
            let height = options.height(ray.at(t_start + step * (i as f64 + 0.5)));
            if height < 0.0 {
                return None;
            }
            depth += options.density(height) * step;
        }
        Some(depth)
    }
}

#[cfg(test)]
mod tests {
    use aether_math::DVec3;

    use super::*;
    use crate::integrator::test_support::{earth, reference_depth, upward_segment};

    #[test]
    fn test_vertical_column_matches_closed_form() {
        let options = earth();
        let (ray, t_end) = upward_segment(&options, 0.0, DVec3::Y);
        let depth = MidpointRule::default()
            .integrate(&options, &ray, 0.0, t_end, 256)
            .unwrap();

        // ∫₀ᵀ exp(-h/H) dh = H (1 - exp(-T/H)) for a vertical column.
        let h = options.rayleigh_scale_height;
        let expected = h * (1.0 - (-options.thickness() / h).exp());
        assert!((depth.rayleigh - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn test_precompute_sums_to_integrate() {
        let options = earth();
        let direction = DVec3::new(1.0, 0.3, 0.0).normalize();
        let (ray, t_end) = upward_segment(&options, 1e-4, direction);
        let rule = MidpointRule::default();

        let nodes = rule.precompute(&options, &ray, 0.0, t_end, 32);
        assert_eq!(nodes.len(), 32);
        let summed = nodes
            .iter()
            .fold(OpticalDepth::ZERO, |acc, node| acc + node.depth);
        let total = rule.integrate(&options, &ray, 0.0, t_end, 32).unwrap();
        assert!((summed.rayleigh - total.rayleigh).abs() < 1e-15);
        assert!((summed.mie - total.mie).abs() < 1e-15);
    }

    #[test]
    fn test_converges_to_reference() {
        let options = earth();
        let direction = DVec3::new(1.0, 0.2, 0.0).normalize();
        let (ray, t_end) = upward_segment(&options, 2e-4, direction);
        let reference = reference_depth(&options, &ray, t_end);
        let depth = MidpointRule::default()
            .integrate(&options, &ray, 0.0, t_end, 4096)
            .unwrap();
        assert!((depth.mie - reference.mie).abs() / reference.mie < 1e-3);
    }

    #[test]
    fn test_ray_into_ground_is_obstructed() {
        let options = earth();
        let (ray, _) = upward_segment(&options, 1e-3, -DVec3::Y);
        assert!(MidpointRule::default().integrate(&options, &ray, 0.0, 0.5, 8).is_none());
    }

    #[test]
    fn test_tangent_ray_is_finite() {
        let options = earth();
        let (ray, t_end) = upward_segment(&options, 0.0, DVec3::X);
        let depth = MidpointRule::default()
            .integrate(&options, &ray, 0.0, t_end, 64)
            .unwrap();
        assert!(depth.is_finite());
        assert!(depth.rayleigh > 0.0 && depth.mie > 0.0);
    }

    #[test]
    fn test_empty_segment() {
        let options = earth();
        let (ray, _) = upward_segment(&options, 0.0, DVec3::Y);
        let depth = MidpointRule::default().integrate(&options, &ray, 0.0, 0.0, 8).unwrap();
        assert_eq!(depth, OpticalDepth::ZERO);
    }
}
