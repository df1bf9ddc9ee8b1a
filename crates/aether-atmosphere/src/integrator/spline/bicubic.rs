use super::CubicSpline;

/// Tensor-product natural cubic spline over a rectangular grid of
/// `(coordinate, distance)` nodes.
///
/// Rows are splines along the distance axis, one per coordinate node; a
/// cross-section at a fixed distance is the spline through the rows
/// evaluated there.
#[derive(Clone, Debug)]
pub struct BicubicSpline {
    coordinates: Vec<f64>,
    rows: Vec<CubicSpline>,
}

impl BicubicSpline {
    /// `values[i][j]` is the sample at `(coordinates[i], distances[j])`.
    pub fn new(coordinates: &[f64], distances: &[f64], values: &[Vec<f64>]) -> Option<Self> {
        if coordinates.len() < 2 || values.len() != coordinates.len() {
            return None;
        }
        let rows = values
            .iter()
            .map(|row| CubicSpline::natural(distances, row))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            coordinates: coordinates.to_vec(),
            rows,
        })
    }

    /// The 1D spline along the coordinate axis at `distance`.
    pub fn cross_section(&self, distance: f64) -> Option<CubicSpline> {
        let values: Vec<f64> = self.rows.iter().map(|row| row.evaluate(distance)).collect();
        CubicSpline::natural(&self.coordinates, &values)
    }

    pub fn evaluate(&self, coordinate: f64, distance: f64) -> Option<f64> {
        self.cross_section(distance)
            .map(|section| section.evaluate(coordinate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bilinear_function_is_exact() {
        let coordinates = [0.0, 1.0, 2.0, 3.0];
        let distances = [0.0, 0.5, 1.0];
        let f = |c: f64, d: f64| 2.0 * c - d + c * d;
        let values: Vec<Vec<f64>> = coordinates
            .iter()
            .map(|&c| distances.iter().map(|&d| f(c, d)).collect())
            .collect();
        let spline = BicubicSpline::new(&coordinates, &distances, &values).unwrap();
        for (c, d) in [(0.3, 0.2), (1.7, 0.9), (2.5, 0.5)] {
            assert!((spline.evaluate(c, d).unwrap() - f(c, d)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rejects_ragged_grid() {
        let values = vec![vec![0.0, 1.0], vec![0.0]];
        assert!(BicubicSpline::new(&[0.0, 1.0], &[0.0, 1.0], &values).is_none());
    }
}
