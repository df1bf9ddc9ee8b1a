//! Angular scattering distributions.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Rayleigh phase function for the cosine `mu` between view and sun directions.
pub fn rayleigh_phase(mu: f64) -> f64 {
    let mu = mu.clamp(-1.0, 1.0);
    3.0 * (1.0 + mu * mu) / (16.0 * PI)
}

/// Approximation of the aerosol phase function, parameterised by the
/// asymmetry `g` (0 isotropic, towards 1 strongly forward).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MiePhase {
    #[default]
    CornetteShanks,
    HenyeyGreenstein,
    Schlick,
}

impl MiePhase {
    pub fn evaluate(self, mu: f64, g: f64) -> f64 {
        let mu = mu.clamp(-1.0, 1.0);
        let g2 = g * g;
        match self {
            MiePhase::CornetteShanks => {
                let num = 3.0 * (1.0 - g2) * (1.0 + mu * mu);
                let denom = 8.0 * PI * (2.0 + g2) * (1.0 + g2 - 2.0 * g * mu).powf(1.5);
                num / denom
            }
            MiePhase::HenyeyGreenstein => {
                (1.0 - g2) / (4.0 * PI * (1.0 + g2 - 2.0 * g * mu).powf(1.5))
            }
            MiePhase::Schlick => {
                let k = 1.55 * g - 0.55 * g2 * g;
                let denom = 1.0 - k * mu;
                (1.0 - k * k) / (4.0 * PI * denom * denom)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Integrate a phase function over the sphere with a midpoint rule in `mu`.
    fn sphere_integral(f: impl Fn(f64) -> f64) -> f64 {
        let n = 200_000;
        let step = 2.0 / n as f64;
        (0..n)
            .map(|i| f(-1.0 + (i as f64 + 0.5) * step) * step)
            .sum::<f64>()
            * 2.0
            * PI
    }

    #[test]
    fn test_rayleigh_normalized() {
        let total = sphere_integral(rayleigh_phase);
        assert!((total - 1.0).abs() < 1e-6, "got {total}");
    }

    #[test]
    fn test_mie_variants_normalized() {
        for phase in [MiePhase::CornetteShanks, MiePhase::HenyeyGreenstein, MiePhase::Schlick] {
            let total = sphere_integral(|mu| phase.evaluate(mu, 0.5));
            assert!((total - 1.0).abs() < 1e-3, "{phase:?} integrates to {total}");
        }
    }

    #[test]
    fn test_mie_forward_peaked() {
        for phase in [MiePhase::CornetteShanks, MiePhase::HenyeyGreenstein, MiePhase::Schlick] {
            assert!(phase.evaluate(1.0, 0.76) > 10.0 * phase.evaluate(0.0, 0.76));
            assert!(phase.evaluate(0.0, 0.76) > phase.evaluate(-1.0, 0.76));
        }
    }

    #[test]
    fn test_isotropic_henyey_greenstein() {
        let iso = 1.0 / (4.0 * PI);
        for mu in [-1.0, -0.3, 0.0, 0.7, 1.0] {
            assert!((MiePhase::HenyeyGreenstein.evaluate(mu, 0.0) - iso).abs() < 1e-12);
        }
    }

    #[test]
    fn test_out_of_range_cosine_is_clamped() {
        let at_one = rayleigh_phase(1.0);
        assert_eq!(rayleigh_phase(1.0 + 1e-12), at_one);
        assert!(MiePhase::CornetteShanks.evaluate(1.0 + 1e-9, 0.76).is_finite());
    }
}
