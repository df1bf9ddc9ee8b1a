//! CPU renderer for atmosphere models: cameras, a row-parallel worker pool
//! and tone-mapped PNG output.

mod camera;
mod error;
mod framebuffer;
mod renderer;

pub use camera::{Camera, Projection};
pub use error::RenderError;
pub use framebuffer::{Framebuffer, ToneMap};
pub use renderer::{
    Progress, RenderSettings, RenderStats, default_threads, render, shade_pixel, thread_bounds,
};
