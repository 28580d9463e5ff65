//! Ducts and duct-like inline elements.

use crate::common::{check_finite, check_positive};
use crate::error::ComponentResult;
use crate::traits::{ComponentFlow, FlowElement, FlowInput};
use afn_core::units::{Area, Length};
use uom::si::{area::square_meter, length::meter};

/// Laminar friction constant (`f = 64 / Re`).
const LAMINAR_FRICTION: f64 = 64.0;
/// Friction constant of the linear initialization conductance.
const INIT_LAMINAR_FRICTION: f64 = 128.0;
/// Roughness assumed for coils and heat exchangers [m].
const INLINE_ROUGHNESS: f64 = 1.0e-4;

const COLEBROOK_MAX_ITER: usize = 100;
const COLEBROOK_TOL: f64 = 1.0e-12;

/// Straight duct with wall friction and lumped fitting losses.
#[derive(Debug, Clone, PartialEq)]
pub struct Duct {
    pub length: f64,
    pub hydraulic_diameter: f64,
    pub area: f64,
    pub roughness: f64,
    /// Sum of local dynamic loss coefficients of the fittings.
    pub fitting_loss: f64,
}

impl Duct {
    pub fn new(
        length: Length,
        hydraulic_diameter: Length,
        area: Area,
        roughness: Length,
        fitting_loss: f64,
    ) -> ComponentResult<Self> {
        let roughness = check_finite(roughness.get::<meter>(), "duct roughness")?;
        let fitting_loss = check_finite(fitting_loss, "fitting loss coefficient")?;
        Ok(Self {
            length: check_positive(length.get::<meter>(), "duct length")?,
            hydraulic_diameter: check_positive(
                hydraulic_diameter.get::<meter>(),
                "hydraulic diameter",
            )?,
            area: check_positive(area.get::<square_meter>(), "duct cross section area")?,
            roughness: roughness.max(0.0),
            fitting_loss: fitting_loss.max(0.0),
        })
    }

    /// Round duct of the given diameter.
    pub fn round(
        length: Length,
        diameter: Length,
        roughness: Length,
        fitting_loss: f64,
    ) -> ComponentResult<Self> {
        let d = check_positive(diameter.get::<meter>(), "duct diameter")?;
        let area = afn_core::units::m2(std::f64::consts::FRAC_PI_4 * d * d);
        Self::new(length, diameter, area, roughness, fitting_loss)
    }

    /// Fully turbulent flow from the Colebrook friction relation, iterated on
    /// `g = 1 / sqrt(f)`.
    fn turbulent_flow(&self, dp_abs: f64, density: f64, viscosity: f64) -> f64 {
        let ld = self.length / self.hydraulic_diameter;
        let ed = (self.roughness / self.hydraulic_diameter).max(1.0e-9);
        let s2 = (2.0 * density * dp_abs).sqrt() * self.area;
        let flow_for = |g: f64| s2 / (ld / (g * g) + self.fitting_loss).sqrt();

        let mut g = (1.14 - 0.868_589 * ed.ln()).clamp(2.0, 30.0);
        let mut ft = flow_for(g);
        for _ in 0..COLEBROOK_MAX_ITER {
            let re = ft * self.hydraulic_diameter / (viscosity * self.area);
            let g_new = (1.14 - 0.868_589 * (ed + 9.3 * g / re).ln()).clamp(2.0, 30.0);
            let ft_new = flow_for(g_new);
            let converged = (ft_new - ft).abs() <= COLEBROOK_TOL * ft_new.abs();
            g = g_new;
            ft = ft_new;
            if converged {
                break;
            }
        }
        ft
    }
}

impl FlowElement for Duct {
    fn type_name(&self) -> &'static str {
        "duct"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        let air = input.upwind();
        let rho = air.density();
        let mu = air.viscosity();
        let ld = self.length / self.hydraulic_diameter;
        let dp = input.pressure_drop;

        if input.linear {
            let g = 2.0 * rho * self.area * self.hydraulic_diameter / (mu * INIT_LAMINAR_FRICTION * ld);
            return ComponentFlow::single(g * dp, g);
        }

        // Laminar: dp = a1 F + a2 F^2.
        let a1 = mu * LAMINAR_FRICTION * ld / (2.0 * rho * self.area * self.hydraulic_diameter);
        let a2 = self.fitting_loss / (2.0 * rho * self.area * self.area);
        let dp_abs = dp.abs();
        let fl = 2.0 * dp_abs / (a1 + (a1 * a1 + 4.0 * a2 * dp_abs).sqrt());
        let ft = self.turbulent_flow(dp_abs, rho, mu);

        if fl <= ft {
            ComponentFlow::single(dp.signum() * fl, 1.0 / (a1 + 2.0 * a2 * fl))
        } else {
            ComponentFlow::single(dp.signum() * ft, 0.5 * ft / dp_abs)
        }
    }
}

/// Heat exchanger passage, modelled as a round duct.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatExchanger {
    duct: Duct,
}

impl HeatExchanger {
    pub fn new(length: Length, hydraulic_diameter: Length) -> ComponentResult<Self> {
        Ok(Self {
            duct: Duct::round(
                length,
                hydraulic_diameter,
                afn_core::units::m(INLINE_ROUGHNESS),
                0.0,
            )?,
        })
    }

    pub fn duct(&self) -> &Duct {
        &self.duct
    }
}

impl FlowElement for HeatExchanger {
    fn type_name(&self) -> &'static str {
        "heat exchanger"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        self.duct.calculate(input)
    }
}

/// Heating or cooling coil, modelled as a round duct.
#[derive(Debug, Clone, PartialEq)]
pub struct Coil {
    duct: Duct,
}

impl Coil {
    pub fn new(length: Length, hydraulic_diameter: Length) -> ComponentResult<Self> {
        Ok(Self {
            duct: Duct::round(
                length,
                hydraulic_diameter,
                afn_core::units::m(INLINE_ROUGHNESS),
                0.0,
            )?,
        })
    }
}

impl FlowElement for Coil {
    fn type_name(&self) -> &'static str {
        "coil"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        self.duct.calculate(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afn_air::AirState;
    use afn_core::units::{m, m2};

    fn supply_duct() -> Duct {
        Duct::new(m(10.0), m(0.3), m2(0.0707), m(9e-5), 1.5).unwrap()
    }

    #[test]
    fn small_pressure_is_laminar() {
        let air = AirState::standard();
        let d = supply_duct();
        let dp = 1e-6;
        let f = d.calculate(&FlowInput::new(dp, &air, &air));
        let a1 = air.viscosity() * 64.0 * (10.0 / 0.3) / (2.0 * air.density() * 0.0707 * 0.3);
        assert!((f.net() - dp / a1).abs() / (dp / a1) < 1e-3);
    }

    #[test]
    fn turbulent_flow_in_expected_range() {
        // 10 m of 300 mm duct at 5 Pa carries a few tenths of a kg/s.
        let air = AirState::standard();
        let f = supply_duct().calculate(&FlowInput::new(5.0, &air, &air));
        assert!(f.net() > 0.1 && f.net() < 1.0, "flow {}", f.net());
        assert!(f.total_derivative() > 0.0);
    }

    #[test]
    fn derivative_matches_finite_difference_when_turbulent() {
        let air = AirState::standard();
        let d = supply_duct();
        let dp = 20.0;
        let f = d.calculate(&FlowInput::new(dp, &air, &air));
        let h = 1e-3;
        let lo = d.calculate(&FlowInput::new(dp - h, &air, &air)).net();
        let hi = d.calculate(&FlowInput::new(dp + h, &air, &air)).net();
        let fd = (hi - lo) / (2.0 * h);
        // Colebrook friction also varies with flow; the secant estimate is
        // within a few percent.
        assert!((fd - f.total_derivative()).abs() / fd < 0.1);
    }

    #[test]
    fn duct_is_odd_in_pressure() {
        let air = AirState::standard();
        let d = supply_duct();
        let a = d.calculate(&FlowInput::new(7.0, &air, &air)).net();
        let b = d.calculate(&FlowInput::new(-7.0, &air, &air)).net();
        assert!((a + b).abs() < 1e-12);
    }

    #[test]
    fn zero_pressure_is_finite() {
        let air = AirState::standard();
        let f = supply_duct().calculate(&FlowInput::new(0.0, &air, &air));
        assert!(f.is_finite());
        assert_eq!(f.net(), 0.0);
        assert!(f.total_derivative() > 0.0);
    }

    #[test]
    fn coil_delegates_to_round_duct() {
        let air = AirState::standard();
        let coil = Coil::new(m(0.5), m(0.4)).unwrap();
        let hx = HeatExchanger::new(m(0.5), m(0.4)).unwrap();
        let input = FlowInput::new(3.0, &air, &air);
        assert_eq!(coil.calculate(&input), hx.calculate(&input));
        assert!((hx.duct().area - std::f64::consts::FRAC_PI_4 * 0.16).abs() < 1e-12);
    }

    #[test]
    fn rejects_degenerate_geometry() {
        assert!(Duct::new(m(10.0), m(0.0), m2(0.07), m(0.0), 0.0).is_err());
        assert!(Duct::new(m(-1.0), m(0.3), m2(0.07), m(0.0), 0.0).is_err());
        assert!(Duct::round(m(1.0), m(-0.2), m(0.0), 0.0).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn flow_is_monotone_and_finite(dp in 0.0f64..500.0, step in 0.0f64..20.0) {
                let air = AirState::standard();
                let d = supply_duct();
                let lo = d.calculate(&FlowInput::new(dp, &air, &air));
                let hi = d.calculate(&FlowInput::new(dp + step, &air, &air));
                prop_assert!(lo.is_finite() && hi.is_finite());
                prop_assert!(hi.net() >= lo.net() - 1e-9 * lo.net().abs());
            }
        }
    }
}
