//! Element that holds a design pressure drop.

use crate::common::check_positive;
use crate::error::ComponentResult;
use crate::traits::{ComponentFlow, FlowElement, FlowInput};
use afn_core::units::{MassRate, Pressure};
use uom::si::{mass_rate::kilogram_per_second, pressure::pascal};

/// Fraction of the design pressure drop over which the flow ramps from the
/// dead band to the design flow.
const RAMP_FRACTION: f64 = 0.05;
/// Conductance inside the dead band relative to the ramp conductance.
const DEAD_BAND_LEAKAGE: f64 = 1.0e-4;

/// Constant pressure drop element.
///
/// Inside `|dp| <= pressure_drop` only a weak leakage passes; outside, the
/// flow rises steeply so the element pins the pressure difference near its
/// design value for any realistic flow. The characteristic is piecewise
/// linear, continuous and strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPressureDrop {
    pub pressure_drop: f64,
    pub design_flow: f64,
    conductance: f64,
}

impl ConstantPressureDrop {
    pub fn new(pressure_drop: Pressure, design_flow: MassRate) -> ComponentResult<Self> {
        let dp = check_positive(pressure_drop.get::<pascal>(), "constant pressure drop")?;
        let flow = check_positive(design_flow.get::<kilogram_per_second>(), "design mass flow")?;
        Ok(Self {
            pressure_drop: dp,
            design_flow: flow,
            conductance: flow / (RAMP_FRACTION * dp),
        })
    }
}

impl FlowElement for ConstantPressureDrop {
    fn type_name(&self) -> &'static str {
        "constant pressure drop"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        let dp = input.pressure_drop;
        if input.linear {
            let g = self.design_flow / self.pressure_drop;
            return ComponentFlow::single(g * dp, g);
        }
        let leak = DEAD_BAND_LEAKAGE * self.conductance;
        let adp = dp.abs();
        if adp <= self.pressure_drop {
            return ComponentFlow::single(leak * dp, leak);
        }
        let f = leak * self.pressure_drop + self.conductance * (adp - self.pressure_drop);
        ComponentFlow::single(dp.signum() * f, self.conductance)
    }
}
