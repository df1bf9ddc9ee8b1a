//! Turns a [`Config`] into a rendered PNG.

use std::path::PathBuf;
use std::thread::JoinHandle;

use aether_atmosphere::{
    AtmosphereModel, DeepAs, FeatureLayout, ImgBased, Midpoint, MidpointRule, Options,
    PrecomputedSs, ScatteringLut, Spline, SplineRule, Sun, Taylor, TaylorApproximation,
    Trapezoidal, TrapezoidalRule,
};
use aether_config::{CliArgs, Config, ModelKind, default_config_dir};
use aether_math::DVec3;
use aether_render::{
    Camera, Framebuffer, Progress, Projection, RenderSettings, RenderStats, ToneMap, render,
};
use crossbeam_channel::Receiver;
use tracing::{info, warn};

use crate::error::AppError;

/// Config directory from `--config`, else the per-user directory, else the
/// working directory.
pub fn config_dir(args: &CliArgs) -> PathBuf {
    args.config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `config.ron`, then the scene file, then command-line overrides.
pub fn load_config(args: &CliArgs) -> Result<Config, AppError> {
    let mut config = Config::load_or_create(&config_dir(args))?;
    if let Some(ref scene) = args.scene {
        config.load_scene(scene)?;
    }
    config.apply_cli_overrides(args);
    config.validate()?;
    Ok(config)
}

pub fn build_options(config: &Config) -> Result<Options, AppError> {
    let sun = Sun::from_degrees(
        config.sun.zenith_degrees,
        config.sun.azimuth_degrees,
        config.sun.intensity,
    );
    Ok(Options::new(&config.planet.params(), sun, config.model.mie_phase)?)
}

/// Camera placed relative to the reference point on the planet surface.
pub fn build_camera(config: &Config, options: &Options) -> Camera {
    let offset = DVec3::from_array(config.camera.origin_m.map(|m| options.scale_length(m)));
    let projection = if config.camera.fisheye {
        Projection::Fisheye
    } else {
        Projection::Pinhole {
            fov_degrees: config.camera.fov_degrees,
        }
    };
    Camera {
        position: DVec3::new(0.0, options.planet_radius(), 0.0) + offset,
        yaw_degrees: config.camera.yaw_degrees,
        pitch_degrees: config.camera.pitch_degrees,
        projection,
    }
}

pub fn tone_map(config: &Config) -> ToneMap {
    ToneMap {
        exposure: config.render.exposure,
        gamma: config.render.gamma,
        flip_horizontal: config.render.flip_horizontal,
        flip_vertical: config.render.flip_vertical,
    }
}

/// Build the configured model, render it and save the image.
pub fn run(config: &Config) -> Result<RenderStats, AppError> {
    config.validate()?;
    let options = build_options(config)?;
    let camera = build_camera(config, &options);
    let samples = &config.samples;

    let (framebuffer, stats) = match config.model.kind {
        ModelKind::Midpoint => {
            let integrator = MidpointRule::new(samples.midpoint_view, samples.midpoint_light);
            render_with(&Midpoint::new(options, integrator), config, &camera)?
        }
        ModelKind::Trapezoidal => {
            let integrator =
                TrapezoidalRule::new(samples.trapezoidal_view, samples.trapezoidal_light);
            render_with(&Trapezoidal::new(options, integrator), config, &camera)?
        }
        ModelKind::Taylor => {
            let integrator = TaylorApproximation::new(samples.taylor_view);
            render_with(&Taylor::new(options, integrator), config, &camera)?
        }
        ModelKind::Spline => {
            let integrator = SplineRule::new(&options, samples.spline_view, samples.spline_grid);
            render_with(&Spline::new(options, integrator), config, &camera)?
        }
        ModelKind::PrecomputedSs => {
            let integrator = MidpointRule::new(samples.lut_view, samples.lut_light);
            let lut = ScatteringLut::load_or_build(
                &config.model.lut_path,
                &options,
                &integrator,
                config.model.lut_dims,
            );
            render_with(&PrecomputedSs::new(options, lut), config, &camera)?
        }
        ModelKind::DeepAs => {
            let layout = if config.model.multi_planet {
                FeatureLayout::multi_planet()
            } else {
                FeatureLayout::SinglePlanet
            };
            let model = DeepAs::load(options, &config.model.network_path, layout)?;
            render_with(&model, config, &camera)?
        }
        ModelKind::ImgBased => {
            let model = ImgBased::load(options, &config.model.network_path)?;
            render_with(&model, config, &camera)?
        }
    };

    framebuffer.save_png(&config.render.output, &tone_map(config))?;
    Ok(stats)
}

fn render_with<M: AtmosphereModel>(
    model: &M,
    config: &Config,
    camera: &Camera,
) -> Result<(Framebuffer, RenderStats), AppError> {
    let settings = RenderSettings {
        width: config.render.width,
        height: config.render.height,
        threads: config.render.threads,
    };
    let (sender, receiver) = crossbeam_channel::unbounded();
    let reporter = spawn_reporter(receiver)?;
    let result = render(model, camera, &settings, Some(&sender));
    drop(sender);
    if reporter.join().is_err() {
        warn!("Progress reporter panicked");
    }
    Ok(result?)
}

fn spawn_reporter(receiver: Receiver<Progress>) -> Result<JoinHandle<()>, AppError> {
    std::thread::Builder::new()
        .name("progress".to_string())
        .spawn(move || {
            let mut log = ProgressLog::default();
            for progress in receiver {
                if let Some(percent) = log.update(progress) {
                    info!(
                        "{percent:>3}% ({}/{} rows)",
                        progress.rows_done, progress.rows_total
                    );
                }
            }
        })
        .map_err(AppError::Spawn)
}

/// Reduces per-row progress events to one report per ten percent.
#[derive(Debug, Default)]
struct ProgressLog {
    reported: usize,
}

impl ProgressLog {
    /// Percentage to report, if `progress` crossed a new ten percent step.
    /// Events may arrive out of order.
    fn update(&mut self, progress: Progress) -> Option<usize> {
        let decile = progress.rows_done * 10 / progress.rows_total.max(1);
        if decile > self.reported {
            self.reported = decile;
            Some(decile * 10)
        } else {
            None
        }
    }
}
