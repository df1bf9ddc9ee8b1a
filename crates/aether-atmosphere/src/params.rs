//! Physical planet description and the scaled, immutable [`Options`] every
//! model is built from.

use aether_math::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::ParamsError;
use crate::integrator::OpticalDepth;
use crate::phase::{MiePhase, rayleigh_phase};

/// Radius of the Earth preset in meters. Used as the reference radius when
/// several planets share one normalisation.
pub const EARTH_RADIUS_M: f64 = 6360e3;

/// Planet and atmosphere in SI units (meters, per-meter coefficients).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetParams {
    /// Radius of the solid surface.
    pub planet_radius_m: f64,
    /// Radius of the top of the atmosphere.
    pub atmosphere_radius_m: f64,
    /// Rayleigh density scale height.
    pub rayleigh_scale_height_m: f64,
    /// Mie density scale height.
    pub mie_scale_height_m: f64,
    /// Rayleigh scattering coefficients at sea level (RGB).
    pub rayleigh_coefficients: [f64; 3],
    /// Mie scattering coefficients at sea level (RGB).
    pub mie_coefficients: [f64; 3],
    /// Mie asymmetry parameter `g`.
    pub mie_asymmetry: f64,
    /// Length scaling factor. `None` uses `1 / planet_radius_m`.
    pub scaling_factor: Option<f64>,
}

impl Default for PlanetParams {
    fn default() -> Self {
        Self::earth()
    }
}

impl PlanetParams {
    pub fn earth() -> Self {
        Self {
            planet_radius_m: EARTH_RADIUS_M,
            atmosphere_radius_m: 6420e3,
            rayleigh_scale_height_m: 8000.0,
            mie_scale_height_m: 1200.0,
            rayleigh_coefficients: [3.8e-6, 13.5e-6, 33.1e-6],
            mie_coefficients: [21e-6; 3],
            mie_asymmetry: 0.76,
            scaling_factor: None,
        }
    }

    pub fn venus() -> Self {
        Self {
            planet_radius_m: 6052e3,
            atmosphere_radius_m: 6052e3 + 200.059e3,
            rayleigh_scale_height_m: 15.9e3,
            mie_scale_height_m: 2.244e3,
            rayleigh_coefficients: [11.37e-6, 11.37e-6, 1.8e-6],
            mie_coefficients: [2.12153e-6; 3],
            mie_asymmetry: 0.76,
            scaling_factor: None,
        }
    }

    pub fn mars() -> Self {
        Self {
            planet_radius_m: 3389.5e3,
            atmosphere_radius_m: 3389.5e3 + 30.588e3,
            rayleigh_scale_height_m: 11.1e3,
            mie_scale_height_m: 1.5671e3,
            rayleigh_coefficients: [23.918e-6, 13.57e-6, 5.78e-6],
            mie_coefficients: [5.12153e-6; 3],
            mie_asymmetry: 0.76,
            scaling_factor: None,
        }
    }

    /// Imaginary planet halfway between Venus and Mars.
    pub fn im7() -> Self {
        Self {
            planet_radius_m: 4.8e6,
            atmosphere_radius_m: 4.8e6 + 1.20368e5,
            rayleigh_scale_height_m: 1.36429e4,
            mie_scale_height_m: 1.92570e3,
            rayleigh_coefficients: [1.72705e-5, 1.24045e-5, 3.67153e-6],
            mie_coefficients: [3.53223e-6; 3],
            mie_asymmetry: 0.76,
            scaling_factor: None,
        }
    }

    fn validate(&self) -> Result<(), ParamsError> {
        let positive = [
            ("planet_radius_m", self.planet_radius_m),
            ("atmosphere_radius_m", self.atmosphere_radius_m),
            ("rayleigh_scale_height_m", self.rayleigh_scale_height_m),
            ("mie_scale_height_m", self.mie_scale_height_m),
        ];
        for (name, value) in positive {
            // Negated so NaN is rejected too.
            if !(value > 0.0) {
                return Err(ParamsError::NonPositive { name, value });
            }
        }
        if self.atmosphere_radius_m <= self.planet_radius_m {
            return Err(ParamsError::AtmosphereBelowSurface {
                planet: self.planet_radius_m,
                atmosphere: self.atmosphere_radius_m,
            });
        }
        Ok(())
    }
}

/// Named planets selectable from configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub enum PlanetPreset {
    #[default]
    Earth,
    Venus,
    Mars,
    Im7,
    Custom(PlanetParams),
}

impl PlanetPreset {
    pub fn params(&self) -> PlanetParams {
        match self {
            PlanetPreset::Earth => PlanetParams::earth(),
            PlanetPreset::Venus => PlanetParams::venus(),
            PlanetPreset::Mars => PlanetParams::mars(),
            PlanetPreset::Im7 => PlanetParams::im7(),
            PlanetPreset::Custom(params) => params.clone(),
        }
    }
}

/// Sun position in the local frame of the reference point at the north pole.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sun {
    /// Angle from `+Y` in radians.
    pub zenith: f64,
    /// Angle around `+Y`, measured from `+X` towards `+Z`, in radians.
    pub azimuth: f64,
    pub intensity: f64,
}

impl Default for Sun {
    fn default() -> Self {
        Self {
            zenith: 0.0,
            azimuth: 0.0,
            intensity: 13.661,
        }
    }
}

impl Sun {
    pub fn from_degrees(zenith: f64, azimuth: f64, intensity: f64) -> Self {
        Self {
            zenith: zenith.to_radians(),
            azimuth: azimuth.to_radians(),
            intensity,
        }
    }

    /// Unit vector pointing towards the sun.
    pub fn direction(&self) -> DVec3 {
        let (sin_z, cos_z) = self.zenith.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        DVec3::new(sin_z * cos_a, cos_z, sin_z * sin_a)
    }
}

/// Which of the two concentric spheres a ray is tested against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shell {
    Planet,
    Atmosphere,
}

/// Scaled atmosphere parameters shared read-only by a render session.
///
/// Built only through [`Options::new`], which applies the length scaling
/// factor `s`: lengths are multiplied by `s` and scattering coefficients
/// divided by it, so optical depths are unchanged. Nothing else in the crate
/// rescales. Outside the crate the scaled values are read through the
/// accessors of the same name.
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    pub(crate) planet_radius: f64,
    pub(crate) atmosphere_radius: f64,
    pub(crate) rayleigh_scale_height: f64,
    pub(crate) mie_scale_height: f64,
    pub(crate) beta_rayleigh: DVec3,
    pub(crate) beta_mie: DVec3,
    pub(crate) mie_asymmetry: f64,
    pub(crate) mie_phase: MiePhase,
    pub(crate) sun: Sun,
    /// Cached `sun.direction()`.
    pub(crate) sun_direction: DVec3,
    pub(crate) scaling_factor: f64,
}

impl Options {
    pub fn new(planet: &PlanetParams, sun: Sun, mie_phase: MiePhase) -> Result<Self, ParamsError> {
        planet.validate()?;
        let s = planet
            .scaling_factor
            .unwrap_or(1.0 / planet.planet_radius_m);
        if !(s.is_finite() && s > 0.0) {
            return Err(ParamsError::InvalidScaling(s));
        }

        Ok(Self {
            planet_radius: planet.planet_radius_m * s,
            atmosphere_radius: planet.atmosphere_radius_m * s,
            rayleigh_scale_height: planet.rayleigh_scale_height_m * s,
            mie_scale_height: planet.mie_scale_height_m * s,
            beta_rayleigh: DVec3::from_array(planet.rayleigh_coefficients) / s,
            beta_mie: DVec3::from_array(planet.mie_coefficients) / s,
            mie_asymmetry: planet.mie_asymmetry,
            mie_phase,
            sun,
            sun_direction: sun.direction(),
            scaling_factor: s,
        })
    }

    /// Same atmosphere lit from a different sun position.
    pub fn with_sun(&self, sun: Sun) -> Self {
        Self {
            sun,
            sun_direction: sun.direction(),
            ..self.clone()
        }
    }

    #[inline]
    pub fn planet_radius(&self) -> f64 {
        self.planet_radius
    }

    #[inline]
    pub fn atmosphere_radius(&self) -> f64 {
        self.atmosphere_radius
    }

    #[inline]
    pub fn rayleigh_scale_height(&self) -> f64 {
        self.rayleigh_scale_height
    }

    #[inline]
    pub fn mie_scale_height(&self) -> f64 {
        self.mie_scale_height
    }

    /// Rayleigh scattering coefficients per model length unit.
    #[inline]
    pub fn beta_rayleigh(&self) -> DVec3 {
        self.beta_rayleigh
    }

    /// Mie scattering coefficients per model length unit.
    #[inline]
    pub fn beta_mie(&self) -> DVec3 {
        self.beta_mie
    }

    #[inline]
    pub fn mie_asymmetry(&self) -> f64 {
        self.mie_asymmetry
    }

    #[inline]
    pub fn mie_phase(&self) -> MiePhase {
        self.mie_phase
    }

    #[inline]
    pub fn sun(&self) -> Sun {
        self.sun
    }

    /// Unit vector towards the sun.
    #[inline]
    pub fn sun_direction(&self) -> DVec3 {
        self.sun_direction
    }

    /// Meters to model units.
    #[inline]
    pub fn scaling_factor(&self) -> f64 {
        self.scaling_factor
    }

    /// Convert a length in meters to model units.
    #[inline]
    pub fn scale_length(&self, meters: f64) -> f64 {
        meters * self.scaling_factor
    }

    /// Convert a length in model units back to meters.
    #[inline]
    pub fn unscale_length(&self, length: f64) -> f64 {
        length / self.scaling_factor
    }

    #[inline]
    pub fn height(&self, position: DVec3) -> f64 {
        position.length() - self.planet_radius
    }

    /// Atmosphere radius minus planet radius.
    #[inline]
    pub fn thickness(&self) -> f64 {
        self.atmosphere_radius - self.planet_radius
    }

    #[inline]
    pub fn radius(&self, shell: Shell) -> f64 {
        match shell {
            Shell::Planet => self.planet_radius,
            Shell::Atmosphere => self.atmosphere_radius,
        }
    }

    /// Relative Rayleigh and Mie densities at `height`.
    #[inline]
    pub fn density(&self, height: f64) -> OpticalDepth {
        OpticalDepth {
            rayleigh: (-height / self.rayleigh_scale_height).exp(),
            mie: (-height / self.mie_scale_height).exp(),
        }
    }

    /// Rayleigh and Mie phase at view/sun cosine `mu`.
    #[inline]
    pub fn phase(&self, mu: f64) -> (f64, f64) {
        (
            rayleigh_phase(mu),
            self.mie_phase.evaluate(mu, self.mie_asymmetry),
        )
    }

    /// Combine in-scattered Rayleigh and Mie light (already multiplied by
    /// their scattering coefficients) into radiance.
    pub fn shade(&self, rayleigh: DVec3, mie: DVec3, mu: f64) -> DVec3 {
        let (phase_r, phase_m) = self.phase(mu);
        (rayleigh * phase_r + mie * phase_m) * self.sun.intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_keeps_optical_thickness() {
        let planet = PlanetParams::earth();
        let options = Options::new(&planet, Sun::default(), MiePhase::default()).unwrap();
        assert!((options.planet_radius - 1.0).abs() < 1e-15);

        // β·H is dimensionless and must not depend on the unit of length.
        let physical = planet.rayleigh_coefficients[2] * planet.rayleigh_scale_height_m;
        let scaled = options.beta_rayleigh.z * options.rayleigh_scale_height;
        assert!((physical - scaled).abs() / physical < 1e-12);
    }

    #[test]
    fn test_explicit_scaling_factor() {
        let planet = PlanetParams {
            scaling_factor: Some(1e-3),
            ..PlanetParams::earth()
        };
        let options = Options::new(&planet, Sun::default(), MiePhase::default()).unwrap();
        assert!((options.planet_radius - 6360.0).abs() < 1e-9);
        assert!((options.scale_length(1000.0) - 1.0).abs() < 1e-12);
        assert!((options.unscale_length(1.0) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_planets_rejected() {
        let inverted = PlanetParams {
            atmosphere_radius_m: 6000e3,
            ..PlanetParams::earth()
        };
        assert!(matches!(
            Options::new(&inverted, Sun::default(), MiePhase::default()),
            Err(ParamsError::AtmosphereBelowSurface { .. })
        ));

        let flat = PlanetParams {
            mie_scale_height_m: 0.0,
            ..PlanetParams::earth()
        };
        assert!(matches!(
            Options::new(&flat, Sun::default(), MiePhase::default()),
            Err(ParamsError::NonPositive { name: "mie_scale_height_m", .. })
        ));

        let bad_scale = PlanetParams {
            scaling_factor: Some(f64::NAN),
            ..PlanetParams::earth()
        };
        assert!(matches!(
            Options::new(&bad_scale, Sun::default(), MiePhase::default()),
            Err(ParamsError::InvalidScaling(_))
        ));
    }

    #[test]
    fn test_every_preset_is_valid() {
        for preset in [
            PlanetPreset::Earth,
            PlanetPreset::Venus,
            PlanetPreset::Mars,
            PlanetPreset::Im7,
        ] {
            assert!(Options::new(&preset.params(), Sun::default(), MiePhase::default()).is_ok());
        }
    }

    #[test]
    fn test_sun_direction() {
        let overhead = Sun::default().direction();
        assert!((overhead - DVec3::Y).length() < 1e-15);

        let horizon = Sun::from_degrees(90.0, 90.0, 1.0).direction();
        assert!((horizon - DVec3::Z).length() < 1e-12);
    }

    #[test]
    fn test_accessors_expose_scaled_values() {
        let planet = PlanetParams::mars();
        let sun = Sun::from_degrees(30.0, 0.0, 10.0);
        let options = Options::new(&planet, sun, MiePhase::Schlick).unwrap();
        let s = 1.0 / planet.planet_radius_m;
        assert_eq!(options.scaling_factor(), s);
        assert!((options.planet_radius() - 1.0).abs() < 1e-15);
        assert_eq!(options.atmosphere_radius(), planet.atmosphere_radius_m * s);
        assert_eq!(options.mie_scale_height(), planet.mie_scale_height_m * s);
        assert_eq!(
            options.beta_rayleigh(),
            DVec3::from_array(planet.rayleigh_coefficients) / s
        );
        assert_eq!(options.mie_phase(), MiePhase::Schlick);
        assert_eq!(options.sun(), sun);
        assert_eq!(options.sun_direction(), sun.direction());
        assert_eq!(options.mie_asymmetry(), 0.76);
    }

    #[test]
    fn test_with_sun_only_moves_sun() {
        let options =
            Options::new(&PlanetParams::earth(), Sun::default(), MiePhase::default()).unwrap();
        let moved = options.with_sun(Sun::from_degrees(60.0, 0.0, 20.0));
        assert_eq!(moved.planet_radius, options.planet_radius);
        assert_eq!(moved.sun.intensity, 20.0);
        assert!((moved.sun_direction.y - 0.5).abs() < 1e-12);
    }
}
