//! Horizontal opening (stairwell, hatch) between a lower and an upper zone.

use crate::common::{GRAVITY, check_positive, check_range, orifice};
use crate::crack::SurfaceCrack;
use crate::error::ComponentResult;
use crate::traits::{ComponentFlow, FlowElement, FlowInput};
use afn_core::units::Length;
use uom::si::length::meter;

/// Shape constant of the buoyant exchange correlation.
const EXCHANGE_SHAPE: f64 = 0.055;

/// Horizontal opening. The link's from node is the lower zone, its to node
/// the upper zone.
///
/// Besides the pressure-driven flow, an unstable density stratification
/// (denser air above) drives a bidirectional exchange that vanishes once the
/// pressure difference reaches the purging value.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalOpening {
    pub width: f64,
    /// Length of the opening in the other horizontal direction.
    pub depth: f64,
    /// Angle of the sloping plane (stairs) to horizontal, 90 for a plain hole.
    pub slope_deg: f64,
    pub discharge_coefficient: f64,
    closed: SurfaceCrack,
}

impl HorizontalOpening {
    pub fn new(
        width: Length,
        depth: Length,
        slope_deg: f64,
        discharge_coefficient: f64,
        closed_coefficient_per_length: f64,
        closed_exponent: f64,
    ) -> ComponentResult<Self> {
        Ok(Self {
            width: check_positive(width.get::<meter>(), "opening width")?,
            depth: check_positive(depth.get::<meter>(), "opening depth")?,
            slope_deg: check_range(slope_deg, 1e-3, 90.0, "sloping plane angle")?,
            discharge_coefficient: check_range(
                discharge_coefficient,
                1e-3,
                1.0,
                "discharge coefficient",
            )?,
            closed: SurfaceCrack::new(closed_coefficient_per_length, closed_exponent)?,
        })
    }
}

impl FlowElement for HorizontalOpening {
    fn type_name(&self) -> &'static str {
        "horizontal opening"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        let factor = input.control.clamp(0.0, 1.0);
        if factor <= 0.0 {
            let perimeter = 2.0 * (self.width + self.depth);
            return self.closed.flow_scaled(perimeter, input);
        }

        let open_depth = self.depth * factor;
        let area = self.width * open_depth * self.slope_deg.to_radians().sin();
        let dp = input.pressure_drop;
        let k = self.discharge_coefficient * area * (2.0 * input.upwind().density()).sqrt();
        let pressure_driven = orifice(k, dp, input.linear);
        if input.linear {
            return pressure_driven;
        }

        let rho_lower = input.from.density();
        let rho_upper = input.to.density();
        if rho_upper <= rho_lower {
            return pressure_driven;
        }

        let rho_mean = 0.5 * (rho_lower + rho_upper);
        let hydraulic_diameter = 2.0 * self.width * open_depth / (self.width + open_depth);
        let exchange_volume = EXCHANGE_SHAPE
            * area
            * (GRAVITY * hydraulic_diameter * (rho_upper - rho_lower) / rho_mean).sqrt();
        let purge = 0.5
            * rho_mean
            * (exchange_volume / (self.discharge_coefficient * area)).powi(2);
        let remaining = if purge > 0.0 {
            (1.0 - dp.abs() / purge).max(0.0)
        } else {
            0.0
        };
        let exchange = rho_mean * exchange_volume * remaining;
        if exchange <= 0.0 {
            return pressure_driven;
        }

        // Up and down exchange cancel in the net flow, so only the
        // pressure-driven part carries a derivative.
        ComponentFlow::two_way(
            [pressure_driven.flow[0] + 0.5 * exchange, -0.5 * exchange],
            [pressure_driven.derivative[0], 0.0],
        )
    }
}
