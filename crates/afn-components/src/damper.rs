//! Motorized damper with a control-dependent flow coefficient.

use crate::common::{check_finite, check_positive, check_range};
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{ComponentFlow, FlowElement, FlowInput};

/// Damper whose flow coefficient is a cubic in the control signal, clamped
/// to `[min_coefficient, max_coefficient]`.
///
/// Below the laminar threshold pressure the flow is linear; above it the
/// power law `F = C sqrt(rho) |dp|^n` applies. Both meet at the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Damper {
    /// Pressure below which the flow is linear [Pa].
    pub laminar_threshold: f64,
    pub min_coefficient: f64,
    pub max_coefficient: f64,
    /// Polynomial `a0 + a1 x + a2 x² + a3 x³` in the control `x`.
    pub polynomial: [f64; 4],
    pub exponent: f64,
}

impl Damper {
    pub fn new(
        laminar_threshold: f64,
        min_coefficient: f64,
        max_coefficient: f64,
        polynomial: [f64; 4],
        exponent: f64,
    ) -> ComponentResult<Self> {
        check_positive(laminar_threshold, "damper laminar threshold")?;
        check_positive(min_coefficient, "damper minimum coefficient")?;
        check_positive(max_coefficient, "damper maximum coefficient")?;
        if min_coefficient > max_coefficient {
            return Err(ComponentError::InvalidArg {
                what: "damper minimum coefficient exceeds maximum",
            });
        }
        for a in polynomial {
            check_finite(a, "damper polynomial coefficient")?;
        }
        Ok(Self {
            laminar_threshold,
            min_coefficient,
            max_coefficient,
            polynomial,
            exponent: check_range(exponent, 0.5, 1.0, "damper flow exponent")?,
        })
    }

    /// Flow coefficient for a control signal in [0, 1].
    pub fn coefficient(&self, control: f64) -> f64 {
        let x = control.clamp(0.0, 1.0);
        let [a0, a1, a2, a3] = self.polynomial;
        (a0 + x * (a1 + x * (a2 + x * a3))).clamp(self.min_coefficient, self.max_coefficient)
    }
}

impl FlowElement for Damper {
    fn type_name(&self) -> &'static str {
        "damper"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        let c = self.coefficient(input.control) * input.upwind().sqrt_density();
        let dp = input.pressure_drop;
        let adp = dp.abs();
        if input.linear || adp <= self.laminar_threshold {
            let slope = c * self.laminar_threshold.powf(self.exponent - 1.0);
            return ComponentFlow::single(slope * dp, slope);
        }
        let ft = c * adp.powf(self.exponent);
        ComponentFlow::single(dp.signum() * ft, self.exponent * ft / adp)
    }

    fn is_directional(&self) -> bool {
        true
    }
}
