//! Command-line argument parsing for the aether renderer.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, ModelKind};

/// Aether command-line arguments.
///
/// CLI values override settings loaded from `config.ron` and the scene file.
#[derive(Parser, Debug, Default)]
#[command(name = "aether", about = "Single-scattering sky renderer")]
pub struct CliArgs {
    /// Image width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Atmosphere model.
    #[arg(long, value_enum)]
    pub model: Option<ModelKind>,

    /// PNG output path.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Scene file applied on top of the config.
    #[arg(long)]
    pub scene: Option<PathBuf>,

    /// Sun zenith angle in degrees.
    #[arg(long)]
    pub sun_zenith: Option<f64>,

    /// Tone-mapping exposure.
    #[arg(long)]
    pub exposure: Option<f64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.render.width = w;
        }
        if let Some(h) = args.height {
            self.render.height = h;
        }
        if let Some(kind) = args.model {
            self.model.kind = kind;
        }
        if let Some(ref output) = args.output {
            self.render.output = output.clone();
        }
        if let Some(zenith) = args.sun_zenith {
            self.sun.zenith_degrees = zenith;
        }
        if let Some(exposure) = args.exposure {
            self.render.exposure = Some(exposure);
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
