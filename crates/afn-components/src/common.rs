//! Shared flow laws and parameter checks.

use crate::error::{ComponentError, ComponentResult};
use crate::traits::ComponentFlow;
use afn_core::numeric::ensure_finite;

/// Standard gravity [m/s²].
pub const GRAVITY: f64 = afn_core::constants::G0_MPS2;

/// Below this pressure difference [Pa] orifice-type flows switch to a
/// linear law so the derivative stays bounded.
pub const LINEAR_PRESSURE_THRESHOLD: f64 = 1.0e-4;

/// Ensure a parameter is finite.
pub fn check_finite(value: f64, what: &'static str) -> ComponentResult<f64> {
    ensure_finite(value, what).map_err(|_| ComponentError::NonPhysical { what })
}

/// Ensure a parameter is finite and strictly positive.
pub fn check_positive(value: f64, what: &'static str) -> ComponentResult<f64> {
    check_finite(value, what)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ComponentError::OutOfRange { what, value })
    }
}

/// Ensure a parameter is finite and within `[lo, hi]`.
pub fn check_range(value: f64, lo: f64, hi: f64, what: &'static str) -> ComponentResult<f64> {
    check_finite(value, what)?;
    if (lo..=hi).contains(&value) {
        Ok(value)
    } else {
        Err(ComponentError::OutOfRange { what, value })
    }
}

/// Power law `F = c |dp|^n` with a laminar branch `F = k dp`.
///
/// The branch with the smaller magnitude wins, which keeps the curve
/// continuous and monotone and gives a finite derivative at zero.
pub fn power_law(turbulent: f64, laminar: f64, exponent: f64, dp: f64, linear: bool) -> ComponentFlow {
    let fl = laminar * dp;
    if linear {
        return ComponentFlow::single(fl, laminar);
    }
    let adp = dp.abs();
    let ft = turbulent * adp.powf(exponent);
    if fl.abs() <= ft {
        ComponentFlow::single(fl, laminar)
    } else {
        ComponentFlow::single(dp.signum() * ft, exponent * ft / adp)
    }
}

/// Orifice law `F = k sqrt(|dp|)` with a linear segment below
/// [`LINEAR_PRESSURE_THRESHOLD`]. Linear mode uses the secant through 1 Pa.
pub fn orifice(k: f64, dp: f64, linear: bool) -> ComponentFlow {
    if linear {
        return ComponentFlow::single(k * dp, k);
    }
    let adp = dp.abs();
    if adp < LINEAR_PRESSURE_THRESHOLD {
        let slope = k / LINEAR_PRESSURE_THRESHOLD.sqrt();
        ComponentFlow::single(slope * dp, slope)
    } else {
        let root = adp.sqrt();
        ComponentFlow::single(dp.signum() * k * root, 0.5 * k / root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_helpers() {
        assert!(check_finite(1.0, "test").is_ok());
        assert!(check_finite(f64::NAN, "test").is_err());
        assert!(check_positive(0.0, "area").is_err());
        assert!(check_range(0.7, 0.5, 1.0, "exponent").is_ok());
        assert!(check_range(1.2, 0.5, 1.0, "exponent").is_err());
    }

    #[test]
    fn power_law_is_laminar_near_zero() {
        let f = power_law(0.01, 5.0, 0.65, 0.0, false);
        assert_eq!(f.flow[0], 0.0);
        assert_eq!(f.derivative[0], 5.0);

        let f = power_law(0.01, 5.0, 0.65, 10.0, false);
        assert!((f.flow[0] - 0.01 * 10f64.powf(0.65)).abs() < 1e-15);
    }

    #[test]
    fn orifice_is_continuous_at_threshold() {
        let below = orifice(2.0, LINEAR_PRESSURE_THRESHOLD * (1.0 - 1e-12), false);
        let above = orifice(2.0, LINEAR_PRESSURE_THRESHOLD, false);
        assert!((below.flow[0] - above.flow[0]).abs() < 1e-10);
        let neg = orifice(2.0, -4.0, false);
        assert!((neg.flow[0] + 4.0).abs() < 1e-12);
        assert!(neg.derivative[0] > 0.0);
    }
}
