//! Line-oriented scene files.
//!
//! Each non-blank line that does not start with `#` is a key followed by
//! whitespace-separated values:
//!
//! ```text
//! # sunset over the ocean
//! size 800 600
//! camera_origin 0 1000 0
//! camera_orientation 10 0
//! sun_angle 88
//! model precomputed-ss
//! ```
//!
//! Keys override the matching [`Config`] fields. Unknown keys and malformed
//! values are errors carrying the 1-based line number.

use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::config::{Config, ModelKind};
use crate::error::ConfigError;

impl Config {
    /// Read `path` and apply it with [`Config::apply_scene`].
    pub fn load_scene(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        self.apply_scene(&text)?;
        log::info!("Applied scene {}", path.display());
        Ok(())
    }

    /// Apply every statement of a scene file. Stops at the first bad line;
    /// earlier lines stay applied.
    pub fn apply_scene(&mut self, text: &str) -> Result<(), ConfigError> {
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let Some(key) = tokens.next() else {
                continue;
            };
            let args: Vec<&str> = tokens.collect();
            self.apply_statement(key, &args)
                .map_err(|message| ConfigError::Scene {
                    line: index + 1,
                    message,
                })?;
        }
        Ok(())
    }

    fn apply_statement(&mut self, key: &str, args: &[&str]) -> Result<(), String> {
        match key {
            "size" => {
                let [w, h] = numbers(key, args)?;
                self.render.width = count(key, w)?;
                self.render.height = count(key, h)?;
            }
            "output" => {
                let [path] = words(key, args)?;
                self.render.output = PathBuf::from(path);
            }
            "camera_origin" => self.camera.origin_m = numbers(key, args)?,
            "camera_orientation" => {
                let [pitch, yaw] = numbers(key, args)?;
                self.camera.pitch_degrees = pitch;
                self.camera.yaw_degrees = yaw;
            }
            "camera_fov" => self.camera.fov_degrees = number(key, args)?,
            "camera_fisheye" => self.camera.fisheye = number(key, args)? != 0.0,
            "sun_angle" => self.sun.zenith_degrees = number(key, args)?,
            "sun_azimuth" => self.sun.azimuth_degrees = number(key, args)?,
            "sun_intensity" => self.sun.intensity = number(key, args)?,
            "exposure" => self.render.exposure = Some(number(key, args)?),
            "model" => {
                let [name] = words(key, args)?;
                self.model.kind = ModelKind::from_str(name, true)
                    .map_err(|_| format!("unknown model {name:?}"))?;
            }
            "midpoint_samples" => self.samples.midpoint_view = samples(key, args)?,
            "midpoint_light_samples" => self.samples.midpoint_light = samples(key, args)?,
            "trapezoidal_samples" => self.samples.trapezoidal_view = samples(key, args)?,
            "trapezoidal_light_samples" => self.samples.trapezoidal_light = samples(key, args)?,
            "taylor_samples" => self.samples.taylor_view = samples(key, args)?,
            "spline_samples" => self.samples.spline_view = samples(key, args)?,
            _ => return Err(format!("unknown key {key:?}")),
        }
        Ok(())
    }
}

fn words<'a, const N: usize>(key: &str, args: &[&'a str]) -> Result<[&'a str; N], String> {
    <[&str; N]>::try_from(args)
        .map_err(|_| format!("{key} takes {N} value(s), got {}", args.len()))
}

fn numbers<const N: usize>(key: &str, args: &[&str]) -> Result<[f64; N], String> {
    let fields: [&str; N] = words(key, args)?;
    let mut values = [0.0; N];
    for (value, word) in values.iter_mut().zip(fields) {
        *value = word
            .parse::<f64>()
            .map_err(|_| format!("{key}: {word:?} is not a number"))?;
        if !value.is_finite() {
            return Err(format!("{key}: {word:?} is not finite"));
        }
    }
    Ok(values)
}

fn number(key: &str, args: &[&str]) -> Result<f64, String> {
    let [value] = numbers(key, args)?;
    Ok(value)
}

fn count(key: &str, value: f64) -> Result<u32, String> {
    if (0.0..=f64::from(u32::MAX)).contains(&value) && value.fract() == 0.0 {
        Ok(value as u32)
    } else {
        Err(format!("{key}: {value} is not a non-negative integer"))
    }
}

fn samples(key: &str, args: &[&str]) -> Result<u32, String> {
    match count(key, number(key, args)?)? {
        0 => Err(format!("{key} must be at least 1")),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUNSET: &str = "\
# sunset over the ocean
size 800 600
output renders/sunset.png

camera_origin 0 1000 0
camera_orientation 10 -90
camera_fov 75
sun_angle 88
sun_azimuth 90
sun_intensity 20
exposure 1.5
model precomputed-ss
midpoint_samples 32
midpoint_light_samples 12
";

    #[test]
    fn test_apply_scene() {
        let mut config = Config::default();
        config.apply_scene(SUNSET).unwrap();
        assert_eq!((config.render.width, config.render.height), (800, 600));
        assert_eq!(config.render.output, PathBuf::from("renders/sunset.png"));
        assert_eq!(config.camera.origin_m, [0.0, 1000.0, 0.0]);
        assert_eq!(config.camera.pitch_degrees, 10.0);
        assert_eq!(config.camera.yaw_degrees, -90.0);
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert!(!config.camera.fisheye);
        assert_eq!(config.sun.zenith_degrees, 88.0);
        assert_eq!(config.sun.azimuth_degrees, 90.0);
        assert_eq!(config.sun.intensity, 20.0);
        assert_eq!(config.render.exposure, Some(1.5));
        assert_eq!(config.model.kind, ModelKind::PrecomputedSs);
        assert_eq!(config.samples.midpoint_view, 32);
        assert_eq!(config.samples.midpoint_light, 12);
        // Untouched keys keep their values.
        assert_eq!(config.samples.taylor_view, 1024);
    }

    #[test]
    fn test_fisheye_flag_and_model_case() {
        let mut config = Config::default();
        config
            .apply_scene("camera_fisheye 1\nmodel Deep-AS\n  # indented comment\n")
            .unwrap();
        assert!(config.camera.fisheye);
        assert_eq!(config.model.kind, ModelKind::DeepAs);
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let cases = [
            ("size 10 10\nfocal_length 35\n", 2),
            ("\n\nsize 10\n", 3),
            ("camera_fov wide\n", 1),
            ("model raytraced\n", 1),
            ("# ok\ntaylor_samples 0\n", 2),
            ("size -4 10\n", 1),
            ("sun_angle NaN\n", 1),
        ];
        for (text, expected) in cases {
            let mut config = Config::default();
            match config.apply_scene(text) {
                Err(ConfigError::Scene { line, .. }) => assert_eq!(line, expected, "{text:?}"),
                other => panic!("{text:?}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_load_scene_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noon.scene");
        std::fs::write(&path, "sun_angle 0\nmodel taylor\n").unwrap();
        let mut config = Config::default();
        config.load_scene(&path).unwrap();
        assert_eq!(config.sun.zenith_degrees, 0.0);
        assert_eq!(config.model.kind, ModelKind::Taylor);

        assert!(matches!(
            config.load_scene(&dir.path().join("missing.scene")),
            Err(ConfigError::ReadError(_))
        ));
    }
}
