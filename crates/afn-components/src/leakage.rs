//! Leakage elements specified by area or by a fraction of a design flow.

use crate::common::{check_positive, check_range, power_law};
use crate::error::ComponentResult;
use crate::traits::{ComponentFlow, FlowElement, FlowInput};
use afn_core::units::{Area, Pressure, VolumeRate};
use uom::si::{area::square_meter, pressure::pascal, volume_rate::cubic_meter_per_second};

/// Leakage given as an effective leakage area at a reference pressure
/// difference.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveLeakageArea {
    /// Effective leakage area [m²].
    pub area: f64,
    pub discharge_coefficient: f64,
    /// Pressure difference the area was rated at [Pa].
    pub reference_pressure: f64,
    pub exponent: f64,
    /// `Cd * ELA * sqrt(2) * dp_ref^(0.5 - n)`, multiplied by `sqrt(rho)` at run time.
    flow_coefficient: f64,
}

impl EffectiveLeakageArea {
    pub fn new(
        area: Area,
        discharge_coefficient: f64,
        reference_pressure: Pressure,
        exponent: f64,
    ) -> ComponentResult<Self> {
        let area = check_positive(area.get::<square_meter>(), "effective leakage area")?;
        let cd = check_range(discharge_coefficient, 1e-3, 1.0, "discharge coefficient")?;
        let dp_ref = check_positive(
            reference_pressure.get::<pascal>(),
            "reference pressure difference",
        )?;
        let n = check_range(exponent, 0.5, 1.0, "flow exponent")?;
        Ok(Self {
            area,
            discharge_coefficient: cd,
            reference_pressure: dp_ref,
            exponent: n,
            flow_coefficient: area * cd * std::f64::consts::SQRT_2 * dp_ref.powf(0.5 - n),
        })
    }
}

impl FlowElement for EffectiveLeakageArea {
    fn type_name(&self) -> &'static str {
        "effective leakage area"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        let air = input.upwind();
        let coef = self.flow_coefficient * input.control.max(0.0);
        let turbulent = coef * air.sqrt_density();
        let laminar = coef * air.density() / air.viscosity();
        power_law(turbulent, laminar, self.exponent, input.pressure_drop, input.linear)
    }
}

/// Duct leak given as a fraction of the system's maximum flow at a reference
/// pressure difference.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveLeakageRatio {
    /// Leaked fraction of the maximum flow at the reference pressure.
    pub ratio: f64,
    /// Maximum volume flow of the distribution system [m³/s].
    pub max_flow: f64,
    /// Pressure difference the ratio applies at [Pa].
    pub reference_pressure: f64,
    pub exponent: f64,
}

impl EffectiveLeakageRatio {
    pub fn new(
        ratio: f64,
        max_flow: VolumeRate,
        reference_pressure: Pressure,
        exponent: f64,
    ) -> ComponentResult<Self> {
        Ok(Self {
            ratio: check_range(ratio, 1e-9, 1.0, "effective leakage ratio")?,
            max_flow: check_positive(
                max_flow.get::<cubic_meter_per_second>(),
                "maximum flow rate",
            )?,
            reference_pressure: check_positive(
                reference_pressure.get::<pascal>(),
                "reference pressure",
            )?,
            exponent: check_range(exponent, 0.5, 1.0, "flow exponent")?,
        })
    }
}

impl FlowElement for EffectiveLeakageRatio {
    fn type_name(&self) -> &'static str {
        "effective leakage ratio"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        let air = input.upwind();
        let turbulent = air.density() * self.ratio * self.max_flow
            / self.reference_pressure.powf(self.exponent)
            * input.control.max(0.0);
        let laminar = turbulent * air.sqrt_density() / air.viscosity();
        power_law(turbulent, laminar, self.exponent, input.pressure_drop, input.linear)
    }
}
