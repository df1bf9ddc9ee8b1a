use aether_math::Ray;

use super::{IntegrationData, Integrator, OpticalDepth};
use crate::params::Options;

/// Composite trapezoid rule: `n + 1` nodes, end nodes at half weight.
///
/// On light rays the march stops at the first node below the surface and the
/// whole segment is reported as obstructed, even when only its far part is
/// in shadow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrapezoidalRule {
    pub view_samples: u32,
    pub light_samples: u32,
}

impl Default for TrapezoidalRule {
    fn default() -> Self {
        Self {
            view_samples: 16,
            light_samples: 8,
        }
    }
}

impl TrapezoidalRule {
    pub fn new(view_samples: u32, light_samples: u32) -> Self {
        Self {
            view_samples,
            light_samples,
        }
    }
}

#[inline]
fn weight(i: u32, intervals: u32, step: f64) -> f64 {
    if i == 0 || i == intervals { step * 0.5 } else { step }
}

impl Integrator for TrapezoidalRule {
    fn name(&self) -> &'static str {
        "trapezoidal"
    }

    fn view_samples(&self) -> u32 {
        self.view_samples
    }

    fn light_samples(&self) -> u32 {
        self.light_samples
    }

    fn precompute(
        &self,
        options: &Options,
        ray: &Ray,
        t_start: f64,
        t_end: f64,
        samples: u32,
    ) -> Vec<IntegrationData> {
        let intervals = samples.max(1);
        let step = (t_end - t_start) / intervals as f64;
        (0..=intervals)
            .map(|i| {
                let position = ray.at(t_start + step * i as f64);
                IntegrationData {
                    position,
                    depth: options.density(options.height(position)) * weight(i, intervals, step),
                }
            })
            .collect()
    }

    fn integrate(
        &self,
        options: &Options,
        ray: &Ray,
        t_start: f64,
        t_end: f64,
        samples: u32,
    ) -> Option<OpticalDepth> {
        let intervals = samples.max(1);
        let step = (t_end - t_start) / intervals as f64;
        let mut depth = OpticalDepth::ZERO;
        for i in 0..=intervals {
            let height = options.height(ray.at(t_start + step * i as f64));
            if height < 0.0 {
                return None;
            }
            depth += options.density(height) * weight(i, intervals, step);
        }
        Some(depth)
    }
}

#[cfg(test)]
mod tests {
    use aether_math::DVec3;

    use super::*;
    use crate::MidpointRule;
    use crate::integrator::test_support::{earth, reference_depth, upward_segment};

    #[test]
    fn test_precompute_has_endpoint_nodes() {
        let options = earth();
        let (ray, t_end) = upward_segment(&options, 0.0, DVec3::Y);
        let nodes = TrapezoidalRule::default().precompute(&options, &ray, 0.0, t_end, 4);
        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes[0].position, ray.origin);
        assert!((nodes[4].position - ray.at(t_end)).length() < 1e-12);

        // Ground node: density 1, half weight.
        let step = t_end / 4.0;
        assert!((nodes[0].depth.rayleigh - step * 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_agrees_with_midpoint_when_refined() {
        let options = earth();
        let direction = DVec3::new(0.5, 1.0, 0.0).normalize();
        let (ray, t_end) = upward_segment(&options, 1e-4, direction);
        let reference = reference_depth(&options, &ray, t_end);
        let trapezoid = TrapezoidalRule::default()
            .integrate(&options, &ray, 0.0, t_end, 4096)
            .unwrap();
        let midpoint = MidpointRule::default()
            .integrate(&options, &ray, 0.0, t_end, 4096)
            .unwrap();
        for depth in [trapezoid, midpoint] {
            assert!((depth.rayleigh - reference.rayleigh).abs() / reference.rayleigh < 1e-3);
        }
    }

    #[test]
    fn test_partial_shadow_drops_whole_segment() {
        let options = earth();
        // Starts in daylight 10 km up, dips below the horizon before exiting.
        let direction = DVec3::new(1.0, -0.1, 0.0).normalize();
        let (ray, _) = upward_segment(&options, options.scale_length(10e3), direction);
        let rule = TrapezoidalRule::default();
        assert!(rule.integrate(&options, &ray, 0.0, 0.3, 8).is_none());
        // The first node alone is lit.
        assert!(rule.integrate(&options, &ray, 0.0, 1e-6, 1).is_some());
    }

    #[test]
    fn test_surface_tangent_is_finite() {
        let options = earth();
        let (ray, t_end) = upward_segment(&options, 0.0, DVec3::X);
        let depth = TrapezoidalRule::default()
            .integrate(&options, &ray, 0.0, t_end, 16)
            .unwrap();
        assert!(depth.is_finite() && depth.rayleigh > 0.0);
    }
}
