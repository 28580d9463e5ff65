use crate::AfnError;

/// Floating point type used throughout the network
pub type Real = f64;

/// Absolute and relative tolerance pair
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, AfnError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(AfnError::NonFinite { what, value: v })
    }
}

/// Require a finite, strictly positive value.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, AfnError> {
    ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(AfnError::InvalidArg { what })
    }
}

/// Require a finite value inside `[lo, hi]`.
pub fn ensure_in_range(v: Real, lo: Real, hi: Real, what: &'static str) -> Result<Real, AfnError> {
    ensure_finite(v, what)?;
    if (lo..=hi).contains(&v) {
        Ok(v)
    } else {
        Err(AfnError::InvalidArg { what })
    }
}

/// Linear interpolation between `(x0, y0)` and `(x1, y1)`.
///
/// Returns `y0` exactly at `x0` and `y1` exactly at `x1`.
pub fn lerp(x: Real, x0: Real, y0: Real, x1: Real, y1: Real) -> Real {
    if x <= x0 || x1 <= x0 {
        return y0;
    }
    if x >= x1 {
        return y1;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// `sign(x) * |x|^n`, zero at zero.
pub fn signed_pow(x: Real, n: Real) -> Real {
    if x == 0.0 {
        0.0
    } else {
        x.signum() * x.abs().powf(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero() {
        assert!(ensure_positive(0.0, "area").is_err());
        assert!(ensure_positive(-1.0, "area").is_err());
        assert_eq!(ensure_positive(2.0, "area").unwrap(), 2.0);
    }

    #[test]
    fn lerp_is_exact_at_knots() {
        assert_eq!(lerp(10.0, 10.0, 0.3, 20.0, -0.7), 0.3);
        assert_eq!(lerp(20.0, 10.0, 0.3, 20.0, -0.7), -0.7);
        assert!((lerp(15.0, 10.0, 0.0, 20.0, 1.0) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn signed_pow_keeps_sign() {
        assert_eq!(signed_pow(-4.0, 0.5), -2.0);
        assert_eq!(signed_pow(0.0, 0.65), 0.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn signed_pow_is_odd(x in -1e4..1e4_f64, n in 0.5..1.0_f64) {
                prop_assert_eq!(signed_pow(-x, n), -signed_pow(x, n));
            }

            #[test]
            fn lerp_stays_between_endpoints(
                t in 0.0..1.0_f64,
                y0 in -10.0..10.0_f64,
                y1 in -10.0..10.0_f64,
            ) {
                let y = lerp(5.0 + 10.0 * t, 5.0, y0, 15.0, y1);
                prop_assert!(y >= y0.min(y1) - 1e-12 && y <= y0.max(y1) + 1e-12);
            }
        }
    }
}
