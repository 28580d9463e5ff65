//! Fans: curve-based, constant volume and zone exhaust.

use afn_air::AirState;

use crate::common::{check_finite, check_positive};
use crate::crack::SurfaceCrack;
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{ComponentFlow, FlowElement, FlowInput};
use afn_core::units::VolumeRate;
use uom::si::volume_rate::cubic_meter_per_second;

/// Number of samples used to check that a fan curve is decreasing.
const MONOTONE_SAMPLES: usize = 64;
const CURVE_SOLVE_MAX_ITER: usize = 60;

/// Cubic pressure rise curve `dp(Q) = c0 + c1 Q + c2 Q² + c3 Q³` [Pa] at the
/// reference density, valid from shutoff (Q = 0) to free delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct FanCurve {
    pub coefficients: [f64; 4],
    /// Volume flow at which the curve ends [m³/s].
    pub free_delivery: f64,
}

impl FanCurve {
    pub fn new(coefficients: [f64; 4], free_delivery: VolumeRate) -> ComponentResult<Self> {
        for c in coefficients {
            check_finite(c, "fan curve coefficient")?;
        }
        let curve = Self {
            coefficients,
            free_delivery: check_positive(
                free_delivery.get::<cubic_meter_per_second>(),
                "fan free delivery flow",
            )?,
        };
        if curve.rise(0.0) <= 0.0 {
            return Err(ComponentError::OutOfRange {
                what: "fan shutoff pressure",
                value: curve.rise(0.0),
            });
        }
        let dq = curve.free_delivery / MONOTONE_SAMPLES as f64;
        let decreasing = (0..MONOTONE_SAMPLES)
            .all(|i| curve.rise((i + 1) as f64 * dq) < curve.rise(i as f64 * dq));
        if !decreasing {
            return Err(ComponentError::InvalidArg {
                what: "fan curve must decrease between shutoff and free delivery",
            });
        }
        Ok(curve)
    }

    /// Pressure rise [Pa] at volume flow `q`.
    pub fn rise(&self, q: f64) -> f64 {
        let [c0, c1, c2, c3] = self.coefficients;
        c0 + q * (c1 + q * (c2 + q * c3))
    }

    /// d(rise)/dQ.
    pub fn slope(&self, q: f64) -> f64 {
        let [_, c1, c2, c3] = self.coefficients;
        c1 + q * (2.0 * c2 + q * 3.0 * c3)
    }

    pub fn shutoff_pressure(&self) -> f64 {
        self.rise(0.0)
    }
}

/// Fan driven by a pressure rise curve, scaled by speed ratio and density
/// with the fan laws. Blows from the link's from node to its to node.
///
/// The control is the speed ratio. At zero speed the fan leaks like a crack;
/// when the back pressure exceeds shutoff the same crack carries reverse
/// flow, and beyond free delivery the curve is extended along its end slope.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailedFan {
    curve: FanCurve,
    /// Density the curve was measured at [kg/m³].
    pub reference_density: f64,
    leakage: SurfaceCrack,
}

impl DetailedFan {
    pub fn new(curve: FanCurve, leakage: SurfaceCrack) -> Self {
        Self {
            curve,
            reference_density: AirState::standard().density(),
            leakage,
        }
    }

    pub fn with_reference_density(mut self, density: f64) -> ComponentResult<Self> {
        self.reference_density = check_positive(density, "fan reference density")?;
        Ok(self)
    }

    pub fn curve(&self) -> &FanCurve {
        &self.curve
    }

    /// Volume flow delivered against `target` pressure rise on the scaled
    /// curve, with its slope. `target` lies between the scaled end and
    /// shutoff values.
    fn solve_curve(&self, speed: f64, ratio: f64, target: f64) -> (f64, f64) {
        let rise = |q: f64| ratio * speed * speed * self.curve.rise(q / speed);
        let slope = |q: f64| ratio * speed * self.curve.slope(q / speed);
        let (mut lo, mut hi) = (0.0, speed * self.curve.free_delivery);
        let mut q = 0.5 * (lo + hi);
        for _ in 0..CURVE_SOLVE_MAX_ITER {
            let r = rise(q) - target;
            if r > 0.0 {
                lo = q;
            } else {
                hi = q;
            }
            let s = slope(q);
            let newton = if s < 0.0 { q - r / s } else { f64::NAN };
            q = if newton > lo && newton < hi {
                newton
            } else {
                0.5 * (lo + hi)
            };
            if hi - lo <= 1e-12 * speed * self.curve.free_delivery || r.abs() <= 1e-10 {
                break;
            }
        }
        (q, slope(q))
    }
}

impl FlowElement for DetailedFan {
    fn type_name(&self) -> &'static str {
        "detailed fan"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        let speed = input.control.clamp(0.0, 2.0);
        if speed <= 0.0 {
            return self.leakage.calculate(&input.with_control(1.0));
        }

        let rho = input.from.density();
        let ratio = rho / self.reference_density;
        let dp = input.pressure_drop;
        let shutoff = ratio * speed * speed * self.curve.shutoff_pressure();
        let q_end = speed * self.curve.free_delivery;
        let min_slope = 1e-3 * shutoff / q_end;

        if input.linear {
            let g = rho * q_end / shutoff;
            return ComponentFlow::single(g * (dp + shutoff), g);
        }

        // Pressure rise the fan has to deliver.
        let target = -dp;
        if target >= shutoff {
            let excess = input.with_control(1.0);
            let excess = FlowInput {
                pressure_drop: dp + shutoff,
                ..excess
            };
            return self.leakage.calculate(&excess);
        }

        let rise_end = ratio * speed * speed * self.curve.rise(self.curve.free_delivery);
        let slope_end = (ratio * speed * self.curve.slope(self.curve.free_delivery)).min(-min_slope);
        if target <= rise_end {
            let q = q_end + (target - rise_end) / slope_end;
            return ComponentFlow::single(rho * q, -rho / slope_end);
        }

        let (q, slope) = self.solve_curve(speed, ratio, target);
        ComponentFlow::single(rho * q, -rho / slope.min(-min_slope))
    }

    fn is_directional(&self) -> bool {
        true
    }
}

/// Fan moving a fixed volume flow times its on-fraction (the control).
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantVolumeFan {
    /// Design volume flow [m³/s].
    pub flow_rate: f64,
}

impl ConstantVolumeFan {
    pub fn new(flow_rate: VolumeRate) -> ComponentResult<Self> {
        Ok(Self {
            flow_rate: check_positive(
                flow_rate.get::<cubic_meter_per_second>(),
                "fan flow rate",
            )?,
        })
    }
}

impl FlowElement for ConstantVolumeFan {
    fn type_name(&self) -> &'static str {
        "constant volume fan"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        let on = input.control.max(0.0);
        ComponentFlow::single(input.from.density() * self.flow_rate * on, 0.0)
    }

    fn is_directional(&self) -> bool {
        true
    }
}

/// Zone exhaust fan: a crack while off, a specified volume flow while on.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneExhaustFan {
    pub flow_rate: f64,
    closed: SurfaceCrack,
}

impl ZoneExhaustFan {
    pub fn new(flow_rate: VolumeRate, closed: SurfaceCrack) -> ComponentResult<Self> {
        Ok(Self {
            flow_rate: check_positive(
                flow_rate.get::<cubic_meter_per_second>(),
                "exhaust fan flow rate",
            )?,
            closed,
        })
    }
}

impl FlowElement for ZoneExhaustFan {
    fn type_name(&self) -> &'static str {
        "zone exhaust fan"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        if input.control <= 0.0 {
            return self.closed.calculate(&input.with_control(1.0));
        }
        ComponentFlow::single(input.from.density() * self.flow_rate * input.control, 0.0)
    }

    fn is_directional(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afn_core::units::m3ps;

    fn curve() -> FanCurve {
        // 300 Pa shutoff, 1 m³/s free delivery.
        FanCurve::new([300.0, -50.0, -250.0, 0.0], m3ps(1.0)).unwrap()
    }

    fn fan() -> DetailedFan {
        DetailedFan::new(curve(), SurfaceCrack::new(0.001, 0.65).unwrap())
    }

    #[test]
    fn curve_rejects_rising_segment() {
        assert!(FanCurve::new([100.0, 200.0, -400.0, 0.0], m3ps(1.0)).is_err());
        assert!(FanCurve::new([-1.0, -1.0, 0.0, 0.0], m3ps(1.0)).is_err());
    }

    #[test]
    fn operating_point_lies_on_curve() {
        let air = AirState::standard();
        let f = fan().calculate(&FlowInput::new(-150.0, &air, &air));
        let q = f.net() / air.density();
        assert!((curve().rise(q) - 150.0).abs() < 1e-6);
        assert!(f.total_derivative() > 0.0);
    }

    #[test]
    fn back_pressure_above_shutoff_reverses_through_leak() {
        let air = AirState::standard();
        let at_shutoff = fan().calculate(&FlowInput::new(-300.0, &air, &air));
        assert!(at_shutoff.net().abs() < 1e-9);
        let over = fan().calculate(&FlowInput::new(-320.0, &air, &air));
        assert!(over.net() < 0.0);
    }

    #[test]
    fn beyond_free_delivery_extends_linearly() {
        let air = AirState::standard();
        let at_end = fan().calculate(&FlowInput::new(0.0, &air, &air));
        assert!((at_end.net() / air.density() - 1.0).abs() < 1e-9);
        let assisted = fan().calculate(&FlowInput::new(50.0, &air, &air));
        assert!(assisted.net() > at_end.net());
    }

    #[test]
    fn half_speed_follows_fan_laws() {
        let air = AirState::standard();
        let f = fan().calculate(&FlowInput::new(-40.0, &air, &air).with_control(0.5));
        let q = f.net() / air.density();
        // rise_s(q) = s² rise(q / s)
        assert!((0.25 * curve().rise(q / 0.5) - 40.0).abs() < 1e-6);
    }

    #[test]
    fn stopped_fan_leaks() {
        let air = AirState::standard();
        let f = fan().calculate(&FlowInput::new(10.0, &air, &air).with_control(0.0));
        assert!((f.net() - 0.001 * 10f64.powf(0.65)).abs() < 1e-12);
    }

    #[test]
    fn constant_volume_and_exhaust_fans() {
        let air = AirState::standard();
        let cvf = ConstantVolumeFan::new(m3ps(0.2)).unwrap();
        let f = cvf.calculate(&FlowInput::new(-40.0, &air, &air).with_control(0.5));
        assert!((f.net() - 0.1 * air.density()).abs() < 1e-12);
        assert_eq!(f.total_derivative(), 0.0);

        let ex = ZoneExhaustFan::new(m3ps(0.05), SurfaceCrack::new(0.002, 0.6).unwrap()).unwrap();
        let off = ex.calculate(&FlowInput::new(4.0, &air, &air).with_control(0.0));
        assert!(off.total_derivative() > 0.0);
        let on = ex.calculate(&FlowInput::new(4.0, &air, &air));
        assert!((on.net() - 0.05 * air.density()).abs() < 1e-12);
    }
}
