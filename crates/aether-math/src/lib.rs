//! f64 ray primitives and sphere intersection for the Aether atmosphere renderer.

mod quadratic;
mod ray;
mod sphere;

pub use glam::{DMat3, DVec3, DVec4};
pub use quadratic::solve_quadratic;
pub use ray::Ray;
pub use sphere::{distance_to_sphere, distance_to_sphere_from, intersect_sphere};
