//! Surface crack: power-law leakage through the building envelope.

use afn_air::AirState;

use crate::common::{check_positive, check_range, power_law};
use crate::error::ComponentResult;
use crate::traits::{ComponentFlow, FlowElement, FlowInput};

/// Power-law leakage path `F = C |dp|^n`.
///
/// The coefficient is measured at reference conditions; the flow is corrected
/// for the density and viscosity of the upwind air. Near zero pressure
/// difference a laminar law takes over.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceCrack {
    /// Flow coefficient at 1 Pa and reference conditions [kg/(s·Pa^n)].
    pub coefficient: f64,
    /// Flow exponent, 0.5 (fully turbulent) to 1.0 (fully laminar).
    pub exponent: f64,
    reference: AirState,
}

impl SurfaceCrack {
    /// Crack with coefficient measured at 20 °C, 101325 Pa, dry air.
    pub fn new(coefficient: f64, exponent: f64) -> ComponentResult<Self> {
        check_positive(coefficient, "crack flow coefficient")?;
        check_range(exponent, 0.5, 1.0, "crack flow exponent")?;
        Ok(Self {
            coefficient,
            exponent,
            reference: AirState::standard(),
        })
    }

    /// Override the conditions the coefficient was measured at.
    pub fn with_reference_conditions(
        mut self,
        temperature_c: f64,
        pressure_pa: f64,
        humidity_ratio: f64,
    ) -> ComponentResult<Self> {
        self.reference = AirState::new(temperature_c, humidity_ratio, pressure_pa)?;
        Ok(self)
    }

    pub fn reference(&self) -> &AirState {
        &self.reference
    }

    /// Temperature correction of the coefficient for the given air.
    pub fn correction(&self, air: &AirState) -> f64 {
        let n = self.exponent;
        (self.reference.density() / air.density()).powf(n - 1.0)
            * (self.reference.viscosity() / air.viscosity()).powf(2.0 * n - 1.0)
    }

    /// Flow for a given coefficient scale (opening perimeters, control).
    pub(crate) fn flow_scaled(&self, scale: f64, input: &FlowInput<'_>) -> ComponentFlow {
        let air = input.upwind();
        let ctl = self.correction(air);
        let c = self.coefficient * scale * ctl;
        let laminar = c * air.sqrt_density() / air.viscosity();
        power_law(c, laminar, self.exponent, input.pressure_drop, input.linear)
    }
}

impl FlowElement for SurfaceCrack {
    fn type_name(&self) -> &'static str {
        "surface crack"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        self.flow_scaled(input.control.max(0.0), input)
    }
}
