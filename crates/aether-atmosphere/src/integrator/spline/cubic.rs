/// Natural cubic spline through `(x_i, y_i)` with an exact antiderivative.
#[derive(Clone, Debug, PartialEq)]
pub struct CubicSpline {
    knots: Vec<f64>,
    /// Per interval: `a + b dx + c dx² + d dx³` with `dx = x - knots[i]`.
    coefficients: Vec<[f64; 4]>,
    /// Integral from `knots[0]` to `knots[i]`.
    cumulative: Vec<f64>,
}

impl CubicSpline {
    /// Interpolate `values` at strictly increasing `knots`.
    ///
    /// Returns `None` for fewer than two knots or mismatched lengths.
    pub fn natural(knots: &[f64], values: &[f64]) -> Option<Self> {
        let n = knots.len();
        if n < 2 || values.len() != n {
            return None;
        }

        let widths: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();
        let curvature = second_derivatives(&widths, values);

        let coefficients: Vec<[f64; 4]> = (0..n - 1)
            .map(|i| {
                let h = widths[i];
                let (m0, m1) = (curvature[i], curvature[i + 1]);
                let slope = (values[i + 1] - values[i]) / h;
                [
                    values[i],
                    slope - h * (2.0 * m0 + m1) / 6.0,
                    m0 * 0.5,
                    (m1 - m0) / (6.0 * h),
                ]
            })
            .collect();

        let mut cumulative = Vec::with_capacity(n);
        cumulative.push(0.0);
        for (i, c) in coefficients.iter().enumerate() {
            let last = cumulative[i];
            cumulative.push(last + antiderivative(c, widths[i]));
        }

        Some(Self {
            knots: knots.to_vec(),
            coefficients,
            cumulative,
        })
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    /// Interval index and offset of `x`, clamped to the domain.
    fn locate(&self, x: f64) -> (usize, f64) {
        let (lo, hi) = self.domain();
        let x = x.clamp(lo, hi);
        let i = self
            .knots
            .partition_point(|&k| k <= x)
            .saturating_sub(1)
            .min(self.coefficients.len() - 1);
        (i, x - self.knots[i])
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let (i, dx) = self.locate(x);
        let [a, b, c, d] = self.coefficients[i];
        a + dx * (b + dx * (c + dx * d))
    }

    /// `∫ spline` from the first knot to `x`, with `x` clamped to the domain.
    pub fn antiderivative(&self, x: f64) -> f64 {
        let (i, dx) = self.locate(x);
        self.cumulative[i] + antiderivative(&self.coefficients[i], dx)
    }

    /// `∫ spline` over `[x1, x2]`.
    pub fn integral(&self, x1: f64, x2: f64) -> f64 {
        self.antiderivative(x2) - self.antiderivative(x1)
    }
}

#[inline]
fn antiderivative(c: &[f64; 4], dx: f64) -> f64 {
    dx * (c[0] + dx * (c[1] / 2.0 + dx * (c[2] / 3.0 + dx * c[3] / 4.0)))
}

/// Second derivatives at the knots with zero curvature at both ends
/// (Thomas algorithm on the tridiagonal system).
fn second_derivatives(widths: &[f64], values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut m = vec![0.0; n];
    if n < 3 {
        return m;
    }

    let inner = n - 2;
    let mut diag = vec![0.0; inner];
    let mut upper = vec![0.0; inner];
    let mut rhs = vec![0.0; inner];
    for k in 0..inner {
        let (h0, h1) = (widths[k], widths[k + 1]);
        diag[k] = 2.0 * (h0 + h1);
        upper[k] = h1;
        rhs[k] = 6.0 * ((values[k + 2] - values[k + 1]) / h1 - (values[k + 1] - values[k]) / h0);
    }

    for k in 1..inner {
        let factor = widths[k] / diag[k - 1];
        diag[k] -= factor * upper[k - 1];
        rhs[k] -= factor * rhs[k - 1];
    }
    m[inner] = rhs[inner - 1] / diag[inner - 1];
    for k in (0..inner - 1).rev() {
        m[k + 1] = (rhs[k] - upper[k] * m[k + 2]) / diag[k];
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(lo: f64, hi: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect()
    }

    #[test]
    fn test_interpolates_knots() {
        let xs = grid(0.0, 2.0, 9);
        let ys: Vec<f64> = xs.iter().map(|x| (-x).exp()).collect();
        let spline = CubicSpline::natural(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(&ys) {
            assert!((spline.evaluate(*x) - y).abs() < 1e-14);
        }
    }

    #[test]
    fn test_reproduces_linear_data() {
        let xs = [0.0, 0.5, 2.0, 3.0];
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x - 1.0).collect();
        let spline = CubicSpline::natural(&xs, &ys).unwrap();
        assert!((spline.evaluate(1.25) - 2.75).abs() < 1e-12);
        // ∫₀³ (3x - 1) dx = 10.5
        assert!((spline.integral(0.0, 3.0) - 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_integral_of_exponential() {
        let xs = grid(0.0, 3.0, 40);
        let ys: Vec<f64> = xs.iter().map(|x| (-x).exp()).collect();
        let spline = CubicSpline::natural(&xs, &ys).unwrap();
        let expected = (-0.5f64).exp() - (-2.5f64).exp();
        assert!((spline.integral(0.5, 2.5) - expected).abs() / expected < 1e-4);
        assert!((spline.integral(2.5, 0.5) + expected).abs() / expected < 1e-4);
    }

    #[test]
    fn test_queries_clamp_to_domain() {
        let spline = CubicSpline::natural(&[0.0, 1.0], &[1.0, 1.0]).unwrap();
        assert_eq!(spline.integral(-5.0, 5.0), 1.0);
        assert_eq!(spline.evaluate(10.0), 1.0);
    }

    #[test]
    fn test_rejects_short_input() {
        assert!(CubicSpline::natural(&[0.0], &[1.0]).is_none());
        assert!(CubicSpline::natural(&[0.0, 1.0], &[1.0]).is_none());
    }
}
