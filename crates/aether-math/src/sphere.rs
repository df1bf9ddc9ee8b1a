use glam::DVec3;

use crate::{Ray, solve_quadratic};

/// Intersect `ray` with the sphere of `radius` centred at the origin.
///
/// Returns the parametric distances `(t0, t1)` with `t0 <= t1`. Both may be
/// negative when the sphere lies behind the ray origin.
pub fn intersect_sphere(ray: &Ray, radius: f64) -> Option<(f64, f64)> {
    let a = ray.direction.length_squared();
    let b = 2.0 * ray.direction.dot(ray.origin);
    let c = ray.origin.length_squared() - radius * radius;
    solve_quadratic(a, b, c)
}

/// Distance along `rmu` (the cosine-scaled radial velocity `r * mu`) from a
/// point at radius `r` to the sphere of `radius`, or `0.0` when the line
/// misses it.
///
/// From inside the sphere this is the exit distance, from outside the
/// nearest crossing.
pub fn distance_to_sphere(r: f64, rmu: f64, radius: f64) -> f64 {
    let delta_sq = radius * radius - r * r + rmu * rmu;
    if delta_sq < 0.0 {
        return 0.0;
    }
    let delta = delta_sq.sqrt();
    if r < radius { -rmu + delta } else { -rmu - delta }
}

/// Convenience for `distance_to_sphere` from a position and unit direction.
pub fn distance_to_sphere_from(position: DVec3, direction: DVec3, radius: f64) -> f64 {
    distance_to_sphere(position.length(), position.dot(direction), radius)
}
