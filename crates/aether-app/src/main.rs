//! `aether`: renders a single-scattering sky to a PNG.
//!
//! Run with: `cargo run --release -p aether-app -- --model precomputed-ss`

mod app;
mod error;

use std::process::ExitCode;

use aether_config::CliArgs;
use clap::Parser;
use tracing::{error, info};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match app::load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("aether: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_dir = app::config_dir(&args).join("logs");
    aether_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    info!(
        "Model: {:?} | {}x{} | sun zenith {:.1} deg, azimuth {:.1} deg",
        config.model.kind,
        config.render.width,
        config.render.height,
        config.sun.zenith_degrees,
        config.sun.azimuth_degrees,
    );

    match app::run(&config) {
        Ok(stats) => {
            info!(
                "Wrote {} ({} threads, {:.2?})",
                config.render.output.display(),
                stats.threads,
                stats.elapsed
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
