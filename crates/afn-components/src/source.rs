//! Flow sources imposed by the HVAC side.

use crate::common::check_finite;
use crate::error::ComponentResult;
use crate::traits::{ComponentFlow, FlowElement, FlowInput};
use afn_core::units::{MassRate, VolumeRate};
use uom::si::{mass_rate::kilogram_per_second, volume_rate::cubic_meter_per_second};

/// Fixed mass flow times the control.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecifiedMassFlow {
    /// [kg/s], positive from -> to.
    pub mass_flow: f64,
}

impl SpecifiedMassFlow {
    pub fn new(mass_flow: MassRate) -> ComponentResult<Self> {
        Ok(Self {
            mass_flow: check_finite(
                mass_flow.get::<kilogram_per_second>(),
                "specified mass flow",
            )?,
        })
    }
}

impl FlowElement for SpecifiedMassFlow {
    fn type_name(&self) -> &'static str {
        "specified mass flow"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        ComponentFlow::single(self.mass_flow * input.control, 0.0)
    }

    fn is_directional(&self) -> bool {
        true
    }
}

/// Fixed volume flow times the control, converted with the density of the
/// air it draws from.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecifiedVolumeFlow {
    /// [m³/s], positive from -> to.
    pub volume_flow: f64,
}

impl SpecifiedVolumeFlow {
    pub fn new(volume_flow: VolumeRate) -> ComponentResult<Self> {
        Ok(Self {
            volume_flow: check_finite(
                volume_flow.get::<cubic_meter_per_second>(),
                "specified volume flow",
            )?,
        })
    }
}

impl FlowElement for SpecifiedVolumeFlow {
    fn type_name(&self) -> &'static str {
        "specified volume flow"
    }

    fn calculate(&self, input: &FlowInput<'_>) -> ComponentFlow {
        let q = self.volume_flow * input.control;
        let air = if q >= 0.0 { input.from } else { input.to };
        ComponentFlow::single(air.density() * q, 0.0)
    }

    fn is_directional(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afn_air::AirState;
    use afn_core::units::{kgps, m3ps};

    #[test]
    fn mass_flow_ignores_pressure() {
        let air = AirState::standard();
        let s = SpecifiedMassFlow::new(kgps(0.3)).unwrap();
        let a = s.calculate(&FlowInput::new(-100.0, &air, &air));
        let b = s.calculate(&FlowInput::new(100.0, &air, &air).with_control(0.5));
        assert_eq!(a.net(), 0.3);
        assert_eq!(b.net(), 0.15);
        assert_eq!(a.total_derivative(), 0.0);
    }

    #[test]
    fn negative_volume_flow_draws_from_to_side() {
        let cold = AirState::new(-10.0, 0.0, 101_325.0).unwrap();
        let warm = AirState::new(30.0, 0.0, 101_325.0).unwrap();
        let s = SpecifiedVolumeFlow::new(m3ps(-0.1)).unwrap();
        let f = s.calculate(&FlowInput::new(0.0, &warm, &cold));
        assert!((f.net() + 0.1 * cold.density()).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_finite_flow() {
        assert!(SpecifiedMassFlow::new(kgps(f64::NAN)).is_err());
    }
}
