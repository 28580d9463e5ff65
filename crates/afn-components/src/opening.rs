//! Large vertical openings (windows, doors) with two-way flow.
//!
//! The pressure difference across an open aperture varies linearly with
//! height because the air densities on the two sides differ:
//! `dp(z) = dp0 - g (rho_from - rho_to) z`. Integrating the orifice law over
//! the height gives one flow when `dp` keeps its sign, and two opposite flows
//! when a neutral plane lies inside the aperture.

use afn_core::numeric::lerp;

use crate::common::{GRAVITY, check_positive, check_range, orifice};
use crate::crack::SurfaceCrack;
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{ComponentFlow, FlowElement, FlowInput};
use afn_core::units::Length;
use uom::si::length::meter;

/// Fraction of the full-aperture sqrt-law slope at 1 Pa used as a lower
/// bound on the derivative of a stratified opening.
const DERIVATIVE_FLOOR_FRACTION: f64 = 1.0e-3;

/// Pressure gradients below this [Pa/m] are treated as uniform.
const MIN_GRADIENT: f64 = 1.0e-9;

/// Effective rectangular aperture for one evaluation.
#[derive(Debug, Clone, Copy)]
struct Aperture {
    discharge_coefficient: f64,
    width: f64,
    height: f64,
    /// Bottom of the aperture above the link reference height [m].
    bottom: f64,
}

/// Integrated flow through an open aperture.
fn aperture_flow(ap: Aperture, min_density_difference: f64, input: &FlowInput<'_>) -> ComponentFlow {
    let rho_from = input.from.density();
    let rho_to = input.to.density();
    let gradient = -GRAVITY * (rho_from - rho_to);
    let dp0 = input.pressure_drop + gradient * ap.bottom;
    let dp_top = dp0 + gradient * ap.height;
    let dp_mid = 0.5 * (dp0 + dp_top);
    let cd_w = ap.discharge_coefficient * ap.width;
    let upwind = |dp: f64| if dp >= 0.0 { rho_from } else { rho_to };

    if input.linear
        || (rho_from - rho_to).abs() < min_density_difference
        || gradient.abs() < MIN_GRADIENT
    {
        let k = cd_w * ap.height * (2.0 * upwind(dp_mid)).sqrt();
        return orifice(k, dp_mid, input.linear);
    }

    let floor = DERIVATIVE_FLOOR_FRACTION * cd_w * ap.height * (rho_from + rho_to).sqrt();
    let inv_grad = 1.0 / gradient.abs();

    if dp0 * dp_top >= 0.0 {
        // One-way flow over the full height.
        let sign = if dp0 != 0.0 { dp0.signum() } else { dp_top.signum() };
        let k = cd_w * (2.0 * upwind(sign)).sqrt();
        let (u0, u1) = (dp0.abs(), dp_top.abs());
        let integral = (2.0 / 3.0) * inv_grad * (u1.powf(1.5) - u0.powf(1.5)).abs();
        let slope = inv_grad * (u1.sqrt() - u0.sqrt()).abs();
        return ComponentFlow::single(sign * k * integral, (k * slope).max(floor));
    }

    // Neutral plane inside the aperture.
    let k_low = cd_w * (2.0 * upwind(dp0)).sqrt();
    let k_high = cd_w * (2.0 * upwind(dp_top)).sqrt();
    let (u0, u1) = (dp0.abs(), dp_top.abs());
    let f_low = dp0.signum() * k_low * (2.0 / 3.0) * inv_grad * u0.powf(1.5);
    let f_high = dp_top.signum() * k_high * (2.0 / 3.0) * inv_grad * u1.powf(1.5);
    let d_low = k_low * inv_grad * u0.sqrt();
    let d_high = k_high * inv_grad * u1.sqrt();
    let total = d_low + d_high;
    if total < floor {
        let bump = floor - total;
        return ComponentFlow::two_way([f_low, f_high], [d_low + bump, d_high]);
    }
    ComponentFlow::two_way([f_low, f_high], [d_low, d_high])
}

/// Density difference threshold in (0, 1] kg/m³.
fn check_density_difference(value: f64) -> ComponentResult<f64> {
    check_positive(value, "minimum density difference")?;
    check_range(value, 0.0, 1.0, "minimum density difference")
}

/// Closed-opening leakage: crack coefficient per metre of perimeter.
fn closed_crack(coefficient_per_length: f64, exponent: f64) -> ComponentResult<SurfaceCrack> {
    SurfaceCrack::new(coefficient_per_length, exponent).map_err(|e| match e {
        ComponentError::OutOfRange { value, .. } => ComponentError::OutOfRange {
            what: "closed opening crack parameter",
            value,
        },
        other => other,
    })
}

/// Rectangular opening whose open width scales with the opening factor.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleOpening {
    pub width: f64,
    pub height: f64,
    pub discharge_coefficient: f64,
    /// Below this density difference [kg/m³] the pressure profile is treated
    /// as uniform.
    pub min_density_difference: f64,
    closed: SurfaceCrack,
}

impl SimpleOpening {
    pub fn new(
        width: Length,
        height: Length,
        discharge_coefficient: f64,
        closed_coefficient_per_length: f64,
        closed_exponent: f64,
        min_density_difference: f64,
    ) -> ComponentResult<Self> {
        Ok(Self {
            width: check_positive(width.get::<meter>(), "opening width")?,
            height: check_positive(height.get::<meter>(), "opening height")?,
            discharge_coefficient: check_range(
                discharge_coefficient,
                1e-3,
                1.0,
                "discharge coefficient",
            )?,
            min_density_difference: check_density_difference(min_density_difference)?,
            closed: closed_crack(closed_coefficient_per_length, closed_exponent)?,
        })
    }

    fn perimeter(&self) -> f64 {
        2.0 * (self.width + self.height)
    }
}

impl FlowElement for SimpleOpening {
    fn type_name(&self) -> &'static str {
        "simple opening"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        let factor = input.control.clamp(0.0, 1.0);
        if factor <= 0.0 {
            return self.closed.flow_scaled(self.perimeter(), input);
        }
        let ap = Aperture {
            discharge_coefficient: self.discharge_coefficient,
            width: self.width * factor,
            height: self.height,
            bottom: 0.0,
        };
        aperture_flow(ap, self.min_density_difference, input)
    }
}

/// One row of a detailed opening's opening-factor table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpeningFactorPoint {
    pub factor: f64,
    pub discharge_coefficient: f64,
    pub width_factor: f64,
    pub height_factor: f64,
    pub start_height_factor: f64,
}

impl OpeningFactorPoint {
    pub fn new(
        factor: f64,
        discharge_coefficient: f64,
        width_factor: f64,
        height_factor: f64,
        start_height_factor: f64,
    ) -> Self {
        Self {
            factor,
            discharge_coefficient,
            width_factor,
            height_factor,
            start_height_factor,
        }
    }
}

/// Non-pivoted rectangular opening described by an opening-factor table.
///
/// The table holds two to four points; the first has factor 0 and the last
/// factor 1. Values between points are linearly interpolated.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailedOpening {
    pub width: f64,
    pub height: f64,
    pub min_density_difference: f64,
    points: Vec<OpeningFactorPoint>,
    closed: SurfaceCrack,
    extra_crack_length: f64,
}

impl DetailedOpening {
    pub fn new(
        width: Length,
        height: Length,
        points: Vec<OpeningFactorPoint>,
        closed_coefficient_per_length: f64,
        closed_exponent: f64,
    ) -> ComponentResult<Self> {
        let width = check_positive(width.get::<meter>(), "opening width")?;
        let height = check_positive(height.get::<meter>(), "opening height")?;
        if !(2..=4).contains(&points.len()) {
            return Err(ComponentError::InvalidArg {
                what: "opening factor table needs 2 to 4 points",
            });
        }
        if points[0].factor != 0.0 || points[points.len() - 1].factor != 1.0 {
            return Err(ComponentError::InvalidArg {
                what: "opening factor table must start at 0 and end at 1",
            });
        }
        if points.windows(2).any(|w| w[1].factor <= w[0].factor) {
            return Err(ComponentError::InvalidArg {
                what: "opening factors must increase",
            });
        }
        for p in &points {
            check_range(p.discharge_coefficient, 0.0, 1.0, "discharge coefficient")?;
            check_range(p.width_factor, 0.0, 1.0, "width factor")?;
            check_range(p.height_factor, 0.0, 1.0, "height factor")?;
            check_range(p.start_height_factor, 0.0, 1.0, "start height factor")?;
            if p.start_height_factor + p.height_factor > 1.0 + 1e-9 {
                return Err(ComponentError::OutOfRange {
                    what: "start height factor plus height factor",
                    value: p.start_height_factor + p.height_factor,
                });
            }
        }
        Ok(Self {
            width,
            height,
            min_density_difference: 1.0e-4,
            points,
            closed: closed_crack(closed_coefficient_per_length, closed_exponent)?,
            extra_crack_length: 0.0,
        })
    }

    pub fn with_min_density_difference(mut self, value: f64) -> ComponentResult<Self> {
        self.min_density_difference = check_density_difference(value)?;
        Ok(self)
    }

    /// Additional crack length when closed, e.g. for multiple sashes [m].
    pub fn with_extra_crack_length(mut self, length: Length) -> ComponentResult<Self> {
        self.extra_crack_length =
            check_range(length.get::<meter>(), 0.0, f64::MAX, "extra crack length")?;
        Ok(self)
    }

    pub fn points(&self) -> &[OpeningFactorPoint] {
        &self.points
    }

    /// Interpolated table row for an opening factor in [0, 1].
    pub fn interpolate(&self, factor: f64) -> OpeningFactorPoint {
        let x = factor.clamp(0.0, 1.0);
        let upper = self
            .points
            .iter()
            .position(|p| p.factor >= x)
            .unwrap_or(self.points.len() - 1)
            .max(1);
        let (a, b) = (self.points[upper - 1], self.points[upper]);
        let at = |ya: f64, yb: f64| lerp(x, a.factor, ya, b.factor, yb);
        OpeningFactorPoint {
            factor: x,
            discharge_coefficient: at(a.discharge_coefficient, b.discharge_coefficient),
            width_factor: at(a.width_factor, b.width_factor),
            height_factor: at(a.height_factor, b.height_factor),
            start_height_factor: at(a.start_height_factor, b.start_height_factor),
        }
    }
}

impl FlowElement for DetailedOpening {
    fn type_name(&self) -> &'static str {
        "detailed opening"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        let factor = input.control.clamp(0.0, 1.0);
        let row = self.interpolate(factor);
        let open_area = row.discharge_coefficient * row.width_factor * row.height_factor;
        if factor <= 0.0 || open_area <= 0.0 {
            let length = 2.0 * (self.width + self.height) + self.extra_crack_length;
            return self.closed.flow_scaled(length, input);
        }
        let ap = Aperture {
            discharge_coefficient: row.discharge_coefficient,
            width: self.width * row.width_factor,
            height: self.height * row.height_factor,
            bottom: self.height * row.start_height_factor,
        };
        aperture_flow(ap, self.min_density_difference, input)
    }
}
