/// Solve `a t² + b t + c = 0`, returning the real roots in ascending order.
///
/// Uses the cancellation-free form: the root with the larger magnitude is
/// derived from `q = -(b + sign(b) sqrt(Δ)) / 2` and the other one from `c / q`.
/// With `b == 0` the roots are `±sqrt(-c / a)`; that case fails when `a == 0`
/// or `-c / a` is negative.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Option<(f64, f64)> {
    if b == 0.0 {
        if a == 0.0 {
            return None;
        }
        let ratio = -c / a;
        if ratio < 0.0 {
            return None;
        }
        let root = ratio.sqrt();
        return Some((-root, root));
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let q = if b < 0.0 {
        -0.5 * (b - sqrt_disc)
    } else {
        -0.5 * (b + sqrt_disc)
    };

    let x1 = q / a;
    let x2 = c / q;
    if x1 > x2 { Some((x2, x1)) } else { Some((x1, x2)) }
}
