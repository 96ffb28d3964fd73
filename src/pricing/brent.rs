//! Bracketed root finding (Brent's method).

use super::PricingError;

/// Absolute tolerance on the root.
pub const X_TOLERANCE: f64 = 1e-12;

/// Iteration cap before giving up.
pub const MAX_ITERATIONS: usize = 100;

/// Find a root of `f` in `[low, high]`.
///
/// `f(low)` and `f(high)` must have opposite signs (or one of them must be
/// zero), otherwise the root is not bracketed.
pub fn find_root<F>(f: F, low: f64, high: f64) -> Result<f64, PricingError>
where
    F: Fn(f64) -> f64,
{
    let mut a = low;
    let mut b = high;
    let mut fa = f(a);
    let mut fb = f(b);

    if !fa.is_finite() || !fb.is_finite() {
        return Err(PricingError::InvalidInput("objective is not finite at bracket ends"));
    }
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if fa.signum() == fb.signum() {
        return Err(PricingError::NotBracketed { low, high });
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for _ in 0..MAX_ITERATIONS {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * X_TOLERANCE;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol || fb == 0.0 {
            return Ok(b);
        }

        if e.abs() >= tol && fa.abs() > fb.abs() {
            // Inverse quadratic interpolation, or secant when only two points are distinct
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * xm * s, 1.0 - s)
            } else {
                let qa = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * qa * (qa - r) - (b - a) * (r - 1.0)),
                    (qa - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();

            let min1 = 3.0 * xm * q - (tol * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            // Bisection
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(xm) };
        fb = f(b);
        if !fb.is_finite() {
            return Err(PricingError::InvalidInput("objective is not finite inside bracket"));
        }
    }

    Err(PricingError::NoConvergence(MAX_ITERATIONS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_finds_polynomial_root() {
        let root = find_root(|x| x * x - 2.0, 0.0, 2.0).unwrap();
        assert_relative_eq!(root, 2.0_f64.sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn test_root_at_bracket_end() {
        assert_eq!(find_root(|x| x - 1.0, 1.0, 3.0).unwrap(), 1.0);
    }

    #[test]
    fn test_unbracketed_root_fails() {
        let err = find_root(|x| x * x + 1.0, -1.0, 1.0).unwrap_err();
        assert_eq!(err, PricingError::NotBracketed { low: -1.0, high: 1.0 });
    }

    #[test]
    fn test_transcendental_root() {
        let root = find_root(|x: f64| x.cos() - x, 0.0, 1.0).unwrap();
        assert_relative_eq!(root, 0.739_085_133_215_160_6, epsilon = 1e-10);
    }
}
