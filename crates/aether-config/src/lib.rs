//! Configuration for the aether sky renderer.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line or from a line-oriented scene file. Every section uses
//! `#[serde(default)]`, so older or partial files keep loading.

mod cli;
mod config;
mod error;
mod scene;

pub use cli::CliArgs;
pub use config::{
    CameraConfig, Config, DebugConfig, ModelConfig, ModelKind, RenderConfig, SampleConfig,
    SunConfig, default_config_dir,
};
pub use error::ConfigError;
