use tracing::debug;

use super::{BicubicSpline, CubicSpline, SplineGrid};

/// Which side of the planet limb a ray's closest approach lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regime {
    /// The closest approach is above the surface (or just below it). The
    /// integrand is tabulated along the ray from the closest approach.
    Above,
    /// The closest approach is inside the planet. The integrand is tabulated
    /// over height, with the path-length Jacobian folded in.
    Below,
}

/// Precomputed column-density integrals for one scale height and regime.
///
/// A bicubic spline of the density integrand is built over
/// `(coordinate, closest-approach distance)` and reduced to 1D cross-sections
/// at every distance node. Queries blend the integrals of the two bracketing
/// cross-sections linearly.
#[derive(Clone, Debug)]
pub struct SplineTable {
    regime: Regime,
    planet_radius: f64,
    sections: Vec<(f64, CubicSpline)>,
}

impl SplineTable {
    /// `offset` keeps the grid away from the Jacobian singularity at the
    /// limb; `section_offset` adds an extra cross-section just inside the
    /// upper distance bound.
    pub fn build(
        regime: Regime,
        scale_height: f64,
        planet_radius: f64,
        atmosphere_radius: f64,
        offset: f64,
        section_offset: f64,
        grid: SplineGrid,
    ) -> Self {
        let r = planet_radius;
        let big_r = atmosphere_radius;
        let h = scale_height;
        let (coordinate_range, distance_range) = match regime {
            Regime::Above => ((0.0, (big_r * big_r - r * r).sqrt()), (r - offset, big_r)),
            Regime::Below => ((0.0, big_r - r), (0.0, r - offset)),
        };

        let coordinates = uniform(coordinate_range, grid.height_points);
        let distances = uniform(distance_range, grid.distance_points);
        let integrand = |x: f64, d: f64| match regime {
            Regime::Above => ((r - (x * x + d * d).sqrt()) / h).exp(),
            Regime::Below => {
                let radius = x + r;
                (-x / h).exp() * radius / ((radius + d) * (radius - d)).sqrt()
            }
        };
        let values: Vec<Vec<f64>> = coordinates
            .iter()
            .map(|&x| distances.iter().map(|&d| integrand(x, d)).collect())
            .collect();

        let mut keys = distances.clone();
        keys.push(distance_range.1 - section_offset);
        keys.sort_by(f64::total_cmp);
        keys.dedup();

        let sections: Vec<(f64, CubicSpline)> =
            BicubicSpline::new(&coordinates, &distances, &values)
                .map(|spline| {
                    keys.iter()
                        .filter_map(|&d| spline.cross_section(d).map(|section| (d, section)))
                        .collect()
                })
                .unwrap_or_default();

        debug!(
            ?regime,
            scale_height,
            sections = keys.len(),
            "built spline table"
        );

        Self {
            regime,
            planet_radius,
            sections,
        }
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    /// Spline coordinate of height `height` on a line whose closest approach
    /// to the centre is `distance`.
    fn coordinate(&self, height: f64, distance: f64) -> f64 {
        match self.regime {
            Regime::Above => {
                let radius = height + self.planet_radius;
                (radius * radius - distance * distance).max(0.0).sqrt()
            }
            Regime::Below => height,
        }
    }

    /// Column density between heights `h1` and `h2` on a line at closest
    /// approach `distance`. Positive when `h2` is further along the line.
    /// Distances outside the tabulated range use the nearest end
    /// cross-section.
    pub fn integral(&self, h1: f64, h2: f64, distance: f64) -> f64 {
        let n = self.sections.len();
        if n < 2 {
            debug!(distance, "spline table has no cross-sections");
            return 0.0;
        }

        let upper = self.sections.partition_point(|(key, _)| *key < distance);
        let (lo, hi) = match upper {
            0 => (0, 1),
            u if u >= n => (n - 2, n - 1),
            u => (u - 1, u),
        };
        let (d_lo, lower_section) = &self.sections[lo];
        let (d_hi, upper_section) = &self.sections[hi];

        let x1 = self.coordinate(h1, distance);
        let x2 = self.coordinate(h2, distance);
        let v_lo = lower_section.integral(x1, x2);
        let v_hi = upper_section.integral(x1, x2);
        let t = ((distance - d_lo) / (d_hi - d_lo)).clamp(0.0, 1.0);
        v_lo + (v_hi - v_lo) * t
    }
}

fn uniform((lo, hi): (f64, f64), points: usize) -> Vec<f64> {
    let points = points.max(2);
    (0..points)
        .map(|i| lo + (hi - lo) * i as f64 / (points - 1) as f64)
        .collect()
}
