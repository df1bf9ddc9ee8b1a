//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use aether_atmosphere::{LutDims, MiePhase, PlanetPreset, SplineGrid};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const APP_NAME: &str = "aether";

/// Per-user configuration directory, `None` when the OS exposes none.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

/// Top-level renderer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Image and output settings.
    pub render: RenderConfig,
    /// Camera placement and projection.
    pub camera: CameraConfig,
    /// Sun position and intensity.
    pub sun: SunConfig,
    /// Planet preset or custom parameters.
    pub planet: PlanetPreset,
    /// Which atmosphere model to render with.
    pub model: ModelConfig,
    /// Integration sample counts.
    pub samples: SampleConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Output image configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// PNG output path.
    pub output: PathBuf,
    /// Exposure for `1 - exp(-c * exposure)`. `None` disables tone mapping.
    pub exposure: Option<f64>,
    /// Apply a 1/2.2 gamma after exposure.
    pub gamma: bool,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    /// Worker thread override (default: one per core in release builds).
    pub threads: Option<usize>,
}

/// Camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Position in meters relative to the reference surface point.
    pub origin_m: [f64; 3],
    /// Rotation around the up axis, from `+X` towards `+Z`, in degrees.
    pub yaw_degrees: f64,
    /// Elevation above the horizon in degrees.
    pub pitch_degrees: f64,
    /// Vertical field of view in degrees (pinhole only).
    pub fov_degrees: f64,
    /// Render an upward hemispherical fisheye instead of a pinhole view.
    pub fisheye: bool,
}

/// Sun configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SunConfig {
    /// Angle from the zenith in degrees.
    pub zenith_degrees: f64,
    /// Angle around the up axis in degrees.
    pub azimuth_degrees: f64,
    pub intensity: f64,
}

/// Atmosphere model selection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ModelKind {
    #[default]
    Midpoint,
    Trapezoidal,
    Taylor,
    Spline,
    PrecomputedSs,
    DeepAs,
    ImgBased,
}

/// Model configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: ModelKind,
    /// Aerosol phase function approximation.
    pub mie_phase: MiePhase,
    /// LUT file, loaded if present and written after a build.
    pub lut_path: PathBuf,
    pub lut_dims: LutDims,
    /// Network artifact for the neural models.
    pub network_path: PathBuf,
    /// The DeepAS network was trained across planets and takes the radii.
    pub multi_planet: bool,
}

/// Sample counts per integrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SampleConfig {
    pub midpoint_view: u32,
    pub midpoint_light: u32,
    pub trapezoidal_view: u32,
    pub trapezoidal_light: u32,
    pub taylor_view: u32,
    pub spline_view: u32,
    pub spline_grid: SplineGrid,
    /// Midpoint sample counts used when building a LUT.
    pub lut_view: u32,
    pub lut_light: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            output: PathBuf::from("output.png"),
            exposure: Some(1.0),
            gamma: true,
            flip_horizontal: false,
            flip_vertical: false,
            threads: None,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            origin_m: [0.0, 1000.0, 0.0],
            yaw_degrees: 0.0,
            pitch_degrees: 0.0,
            fov_degrees: 60.0,
            fisheye: false,
        }
    }
}

impl Default for SunConfig {
    fn default() -> Self {
        Self {
            zenith_degrees: 45.0,
            azimuth_degrees: 0.0,
            intensity: 13.661,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::Midpoint,
            mie_phase: MiePhase::CornetteShanks,
            lut_path: PathBuf::from("precomputed_ss.lut"),
            lut_dims: LutDims::default(),
            network_path: PathBuf::from("network.bin"),
            multi_planet: false,
        }
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            midpoint_view: 16,
            midpoint_light: 8,
            trapezoidal_view: 16,
            trapezoidal_light: 8,
            taylor_view: 1024,
            spline_view: 1024,
            spline_grid: SplineGrid::default(),
            lut_view: 16,
            lut_light: 8,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Validation ---

fn at_least(field: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is below the minimum of {min}"),
        });
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("{value} must be a positive number"),
        });
    }
    Ok(())
}

impl Config {
    /// Reject values the renderer cannot work with.
    ///
    /// Sample counts and LUT dimensions must be at least 1, spline grids need
    /// two nodes per axis, exposure and sun intensity must be positive and
    /// the field of view must lie in `(0, 180)` degrees.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let samples = &self.samples;
        for (field, count) in [
            ("samples.midpoint_view", samples.midpoint_view),
            ("samples.midpoint_light", samples.midpoint_light),
            ("samples.trapezoidal_view", samples.trapezoidal_view),
            ("samples.trapezoidal_light", samples.trapezoidal_light),
            ("samples.taylor_view", samples.taylor_view),
            ("samples.spline_view", samples.spline_view),
            ("samples.lut_view", samples.lut_view),
            ("samples.lut_light", samples.lut_light),
        ] {
            at_least(field, count as usize, 1)?;
        }
        let SplineGrid {
            height_points,
            distance_points,
        } = samples.spline_grid;
        at_least("samples.spline_grid.height_points", height_points, 2)?;
        at_least("samples.spline_grid.distance_points", distance_points, 2)?;

        let dims = self.model.lut_dims;
        at_least("model.lut_dims.heights", dims.heights, 1)?;
        at_least("model.lut_dims.sun_angles", dims.sun_angles, 1)?;
        at_least("model.lut_dims.view_angles", dims.view_angles, 1)?;

        if let Some(exposure) = self.render.exposure {
            positive("render.exposure", exposure)?;
        }
        positive("sun.intensity", self.sun.intensity)?;
        if !(self.camera.fov_degrees > 0.0 && self.camera.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid {
                field: "camera.fov_degrees",
                reason: format!("{} is outside (0, 180)", self.camera.fov_degrees),
            });
        }
        Ok(())
    }
}

// --- Load / Save ---

impl Config {
    /// Load and validate `config.ron` from `config_dir`, or write the
    /// defaults there when it does not exist yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if !config_path.exists() {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        config.validate()?;
        log::info!(
            "Loaded config from {} (model {:?}, {}x{})",
            config_path.display(),
            config.model.kind,
            config.render.width,
            config.render.height
        );
        Ok(config)
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}
