//! Linear RGB image storage and 8-bit PNG output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use aether_math::DVec3;
use tracing::info;

use crate::error::RenderError;

/// Row-major radiance image, row 0 at the top.
#[derive(Clone, Debug, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<DVec3>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![DVec3::ZERO; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[DVec3] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [DVec3] {
        &mut self.pixels
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> DVec3 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Quantise to RGBA8 with alpha 255.
    pub fn to_rgba8(&self, tone: &ToneMap) -> Vec<u8> {
        let (width, height) = (self.width as usize, self.height as usize);
        let mut image = vec![0u8; width * height * 4];
        for y in 0..height {
            let src_y = if tone.flip_vertical { height - 1 - y } else { y };
            for x in 0..width {
                let src_x = if tone.flip_horizontal { width - 1 - x } else { x };
                let color = tone.apply(self.pixels[src_y * width + src_x]);
                let offset = (y * width + x) * 4;
                image[offset..offset + 4].copy_from_slice(&[
                    quantize(color.x),
                    quantize(color.y),
                    quantize(color.z),
                    255,
                ]);
            }
        }
        image
    }

    pub fn write_png<W: Write>(&self, out: W, tone: &ToneMap) -> Result<(), RenderError> {
        let mut encoder = png::Encoder::new(out, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.to_rgba8(tone))?;
        writer.finish()?;
        Ok(())
    }

    pub fn save_png(&self, path: &Path, tone: &ToneMap) -> Result<(), RenderError> {
        let file = File::create(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_png(BufWriter::new(file), tone)?;
        info!("Saved {}x{} render to {}", self.width, self.height, path.display());
        Ok(())
    }
}

/// Display transform from radiance to `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneMap {
    /// `c -> 1 - exp(-c * exposure)`. `None` passes radiance through.
    pub exposure: Option<f64>,
    /// Apply a `1 / 2.2` gamma after exposure.
    pub gamma: bool,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl Default for ToneMap {
    fn default() -> Self {
        Self {
            exposure: Some(1.0),
            gamma: true,
            flip_horizontal: false,
            flip_vertical: false,
        }
    }
}

impl ToneMap {
    pub fn apply(&self, color: DVec3) -> DVec3 {
        let mut color = color;
        if let Some(exposure) = self.exposure {
            color = DVec3::ONE - (-color * exposure).exp();
        }
        if self.gamma {
            color = color.max(DVec3::ZERO).powf(1.0 / 2.2);
        }
        color
    }
}

fn quantize(value: f64) -> u8 {
    // `as` saturates, NaN maps to 0.
    (255.0 * value.clamp(0.0, 1.0)) as u8
}
