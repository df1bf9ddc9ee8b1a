//! Row-parallel frame rendering.
//!
//! The image is split into contiguous row ranges, one per worker. Each worker
//! owns a disjoint slice of the framebuffer, so pixel writes need no
//! synchronisation. Completed rows are counted with an atomic and reported on
//! an optional channel.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use aether_atmosphere::{AtmosphereModel, Shell};
use aether_math::{DVec3, Ray};
use crossbeam_channel::Sender;
use tracing::{info, warn};

use crate::camera::Camera;
use crate::error::RenderError;
use crate::framebuffer::Framebuffer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Worker count. `None` uses [`default_threads`].
    pub threads: Option<usize>,
}

/// Rows finished so far, pushed after every row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub rows_done: usize,
    pub rows_total: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderStats {
    pub threads: usize,
    /// Pixels whose radiance was not finite and were written as black.
    pub non_finite: usize,
    pub elapsed: Duration,
}

/// One worker per core in release builds, one in debug builds so renders are
/// reproducible while debugging.
pub fn default_threads() -> usize {
    if cfg!(debug_assertions) { 1 } else { num_cpus::get().max(1) }
}

/// Split `rows` into `parts` contiguous ranges. The last range takes the
/// remainder.
pub fn thread_bounds(parts: usize, rows: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    let delta = rows / parts;
    let remainder = rows % parts;
    let mut bounds = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let mut end = start + delta;
        if i == parts - 1 {
            end += remainder;
        }
        bounds.push(start..end);
        start = end;
    }
    bounds
}

/// Radiance seen along a primary ray, clipped at the ground.
pub fn shade_pixel<M: AtmosphereModel + ?Sized>(model: &M, ray: &Ray) -> DVec3 {
    if !ray.valid {
        return DVec3::ZERO;
    }
    let t_max = match model.intersect(ray, Shell::Planet) {
        Some((t0, t1)) if t1 > 0.0 => t0.max(0.0),
        _ => f64::INFINITY,
    };
    model.compute_incident_light(ray, 0.0, t_max)
}

/// Render a full frame. Blocks until every worker has joined.
pub fn render<M: AtmosphereModel + ?Sized>(
    model: &M,
    camera: &Camera,
    settings: &RenderSettings,
    progress: Option<&Sender<Progress>>,
) -> Result<(Framebuffer, RenderStats), RenderError> {
    let (width, height) = (settings.width, settings.height);
    let rows = height as usize;
    let threads = settings
        .threads
        .unwrap_or_else(default_threads)
        .clamp(1, rows.max(1));
    info!(
        "Rendering {width}x{height} with {} on {threads} thread(s)",
        model.name()
    );

    let start = Instant::now();
    let mut framebuffer = Framebuffer::new(width, height);
    let counter = AtomicUsize::new(0);
    let row_len = width as usize;

    // No pixels to shade: report the rows as done without spawning workers.
    if row_len * rows == 0 {
        if let Some(sender) = progress.filter(|_| rows > 0) {
            let _ = sender.send(Progress {
                rows_done: rows,
                rows_total: rows,
            });
        }
        let stats = RenderStats {
            threads,
            non_finite: 0,
            elapsed: start.elapsed(),
        };
        return Ok((framebuffer, stats));
    }

    let non_finite = std::thread::scope(|scope| -> Result<usize, RenderError> {
        let mut rest = framebuffer.pixels_mut();
        let mut handles = Vec::with_capacity(threads);
        for (index, bounds) in thread_bounds(threads, rows).into_iter().enumerate() {
            let (slice, tail) = std::mem::take(&mut rest).split_at_mut(bounds.len() * row_len);
            rest = tail;
            let counter = &counter;
            let handle = std::thread::Builder::new()
                .name(format!("render-{index}"))
                .spawn_scoped(scope, move || {
                    let mut non_finite = 0;
                    for (row, y) in slice.chunks_mut(row_len.max(1)).zip(bounds) {
                        for (x, pixel) in row.iter_mut().enumerate() {
                            let ray = camera.ray(x as u32, y as u32, width, height);
                            let color = shade_pixel(model, &ray);
                            *pixel = if color.is_finite() {
                                color
                            } else {
                                non_finite += 1;
                                DVec3::ZERO
                            };
                        }
                        let rows_done = counter.fetch_add(1, Ordering::Relaxed) + 1;
                        if let Some(sender) = progress {
                            // A dropped receiver only loses progress output.
                            let _ = sender.send(Progress {
                                rows_done,
                                rows_total: rows,
                            });
                        }
                    }
                    non_finite
                })
                .map_err(RenderError::Spawn)?;
            handles.push(handle);
        }

        // Every worker is joined before a panic is reported.
        let mut total = 0;
        let mut panicked = None;
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(count) => total += count,
                Err(_) => {
                    panicked.get_or_insert(index);
                }
            }
        }
        match panicked {
            Some(index) => Err(RenderError::WorkerPanicked(index)),
            None => Ok(total),
        }
    })?;

    if non_finite > 0 {
        warn!("{non_finite} pixel(s) had non-finite radiance and were set to black");
    }
    let stats = RenderStats {
        threads,
        non_finite,
        elapsed: start.elapsed(),
    };
    info!("Render finished in {:.2?}", stats.elapsed);
    Ok((framebuffer, stats))
}

#[cfg(test)]
mod tests {
    use aether_atmosphere::{
        MidpointRule, MiePhase, Options, PlanetParams, ScatteringModel, Sun, TrapezoidalRule,
    };
    use crossbeam_channel::unbounded;

    use super::*;
    use crate::camera::Projection;

    fn earth() -> Options {
        let sun = Sun::from_degrees(45.0, 0.0, 13.661);
        Options::new(&PlanetParams::earth(), sun, MiePhase::default()).unwrap()
    }

    fn ground_camera(options: &Options, projection: Projection) -> Camera {
        let height = options.planet_radius() + options.scale_length(1000.0);
        Camera {
            position: DVec3::new(0.0, height, 0.0),
            yaw_degrees: 0.0,
            pitch_degrees: 10.0,
            projection,
        }
    }

    /// Returns NaN for rays pointing into the `+Z` half space.
    struct Faulty(Options);

    impl AtmosphereModel for Faulty {
        fn name(&self) -> &'static str {
            "faulty"
        }

        fn options(&self) -> &Options {
            &self.0
        }

        fn compute_incident_light(&self, ray: &Ray, _t_min: f64, _t_max: f64) -> DVec3 {
            if ray.direction.z > 0.0 { DVec3::NAN } else { DVec3::ONE }
        }
    }

    #[test]
    fn test_thread_bounds() {
        assert_eq!(thread_bounds(3, 10), vec![0..3, 3..6, 6..10]);
        assert_eq!(thread_bounds(1, 7), vec![0..7]);
        assert_eq!(thread_bounds(0, 4), vec![0..4]);
        assert_eq!(thread_bounds(4, 2), vec![0..0, 0..0, 0..0, 0..2]);
        let covered: usize = thread_bounds(7, 1080).iter().map(|r| r.len()).sum();
        assert_eq!(covered, 1080);
    }

    #[test]
    fn test_thread_count_does_not_change_image() {
        let options = earth();
        let model = ScatteringModel::new(options.clone(), MidpointRule::new(8, 4));
        let camera = ground_camera(&options, Projection::Pinhole { fov_degrees: 70.0 });
        let single = RenderSettings {
            width: 12,
            height: 9,
            threads: Some(1),
        };
        let (reference, _) = render(&model, &camera, &single, None).unwrap();
        let (parallel, stats) = render(
            &model,
            &camera,
            &RenderSettings {
                threads: Some(4),
                ..single
            },
            None,
        )
        .unwrap();
        assert_eq!(stats.threads, 4);
        assert_eq!(reference, parallel);
        assert!(reference.pixels().iter().all(|p| p.is_finite()));
        assert!(reference.pixels().iter().any(|p| p.z > 0.0));
    }

    #[test]
    fn test_progress_reports_every_row() {
        let options = earth();
        let model = ScatteringModel::new(options.clone(), TrapezoidalRule::new(4, 2));
        let camera = ground_camera(&options, Projection::Fisheye);
        let (sender, receiver) = unbounded();
        let settings = RenderSettings {
            width: 8,
            height: 6,
            threads: Some(3),
        };
        render(&model, &camera, &settings, Some(&sender)).unwrap();
        drop(sender);

        let mut done: Vec<usize> = receiver.iter().map(|p| p.rows_done).collect();
        done.sort_unstable();
        assert_eq!(done, (1..=6).collect::<Vec<_>>());
    }

    #[test]
    fn test_fisheye_corners_are_black() {
        let options = earth();
        let model = ScatteringModel::new(options.clone(), MidpointRule::new(4, 2));
        let camera = ground_camera(&options, Projection::Fisheye);
        let (fb, _) = render(
            &model,
            &camera,
            &RenderSettings {
                width: 9,
                height: 9,
                threads: Some(2),
            },
            None,
        )
        .unwrap();
        assert_eq!(fb.pixel(0, 0), DVec3::ZERO);
        assert_eq!(fb.pixel(8, 8), DVec3::ZERO);
        assert!(fb.pixel(4, 4).element_sum() > 0.0);
    }

    #[test]
    fn test_non_finite_pixels_are_zeroed_and_counted() {
        let options = earth();
        let model = Faulty(options.clone());
        let camera = ground_camera(&options, Projection::Pinhole { fov_degrees: 90.0 });
        let (fb, stats) = render(
            &model,
            &camera,
            &RenderSettings {
                width: 4,
                height: 2,
                threads: Some(2),
            },
            None,
        )
        .unwrap();
        // Right half of the image looks towards +Z.
        assert_eq!(stats.non_finite, 4);
        assert_eq!(fb.pixel(3, 0), DVec3::ZERO);
        assert_eq!(fb.pixel(0, 0), DVec3::ONE);
    }

    #[test]
    fn test_empty_image() {
        let options = earth();
        let model = Faulty(options.clone());
        let camera = ground_camera(&options, Projection::Fisheye);
        let (fb, stats) = render(
            &model,
            &camera,
            &RenderSettings {
                width: 0,
                height: 0,
                threads: None,
            },
            None,
        )
        .unwrap();
        assert!(fb.pixels().is_empty());
        assert_eq!(stats.non_finite, 0);
    }

    #[test]
    fn test_zero_width_reports_completion_once() {
        let options = earth();
        let model = Faulty(options.clone());
        let camera = ground_camera(&options, Projection::Fisheye);
        let (sender, receiver) = unbounded();
        let settings = RenderSettings {
            width: 0,
            height: 3,
            threads: Some(2),
        };
        let (fb, stats) = render(&model, &camera, &settings, Some(&sender)).unwrap();
        drop(sender);

        assert_eq!((fb.width(), fb.height()), (0, 3));
        assert_eq!(stats.non_finite, 0);
        let events: Vec<Progress> = receiver.iter().collect();
        assert_eq!(
            events,
            vec![Progress {
                rows_done: 3,
                rows_total: 3
            }]
        );
    }

    #[test]
    fn test_dyn_model_renders() {
        let options = earth();
        let model: Box<dyn AtmosphereModel> =
            Box::new(ScatteringModel::new(options.clone(), MidpointRule::new(4, 2)));
        let camera = ground_camera(&options, Projection::Pinhole { fov_degrees: 60.0 });
        let settings = RenderSettings {
            width: 3,
            height: 3,
            threads: Some(1),
        };
        let (fb, _) = render(model.as_ref(), &camera, &settings, None).unwrap();
        assert!(fb.pixel(1, 1).element_sum() > 0.0);
    }
}
