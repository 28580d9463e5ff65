//! Air state at a network node.

use afn_core::constants::{REFERENCE_TEMPERATURE_C, STANDARD_PRESSURE_PA};
use afn_core::units::{Pressure, Temperature, to_degc};
use uom::si::pressure::pascal;

use crate::error::{AirError, AirResult};
use crate::properties::{air_viscosity, moist_air_density};

const MIN_TEMPERATURE_C: f64 = -100.0;
const MAX_TEMPERATURE_C: f64 = 200.0;

/// Air properties at one node, computed once per timestep and read by every
/// component touching that node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirState {
    temperature_c: f64,
    humidity_ratio: f64,
    density: f64,
    sqrt_density: f64,
    viscosity: f64,
}

impl AirState {
    /// Form a state from dry-bulb temperature [°C], humidity ratio [kg/kg]
    /// and barometric pressure [Pa].
    pub fn new(temperature_c: f64, humidity_ratio: f64, pressure_pa: f64) -> AirResult<Self> {
        if !temperature_c.is_finite() {
            return Err(AirError::NonPhysical {
                what: "temperature",
                value: temperature_c,
            });
        }
        if !(MIN_TEMPERATURE_C..=MAX_TEMPERATURE_C).contains(&temperature_c) {
            return Err(AirError::OutOfRange {
                what: "temperature",
                value: temperature_c,
            });
        }
        if !humidity_ratio.is_finite() || humidity_ratio < 0.0 {
            return Err(AirError::NonPhysical {
                what: "humidity ratio",
                value: humidity_ratio,
            });
        }
        if !pressure_pa.is_finite() || pressure_pa <= 0.0 {
            return Err(AirError::NonPhysical {
                what: "barometric pressure",
                value: pressure_pa,
            });
        }

        let density = moist_air_density(pressure_pa, temperature_c, humidity_ratio);
        Ok(Self {
            temperature_c,
            humidity_ratio,
            density,
            sqrt_density: density.sqrt(),
            viscosity: air_viscosity(temperature_c),
        })
    }

    /// Same as [`AirState::new`] with unit-checked temperature and pressure.
    pub fn from_conditions(
        temperature: Temperature,
        humidity_ratio: f64,
        pressure: Pressure,
    ) -> AirResult<Self> {
        Self::new(to_degc(temperature), humidity_ratio, pressure.get::<pascal>())
    }

    /// Dry air at 20 °C and 101325 Pa.
    pub fn standard() -> Self {
        let density = moist_air_density(STANDARD_PRESSURE_PA, REFERENCE_TEMPERATURE_C, 0.0);
        Self {
            temperature_c: REFERENCE_TEMPERATURE_C,
            humidity_ratio: 0.0,
            density,
            sqrt_density: density.sqrt(),
            viscosity: air_viscosity(REFERENCE_TEMPERATURE_C),
        }
    }

    /// Dry-bulb temperature [°C].
    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    /// Humidity ratio [kg water / kg dry air].
    pub fn humidity_ratio(&self) -> f64 {
        self.humidity_ratio
    }

    /// Density [kg/m³].
    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn sqrt_density(&self) -> f64 {
        self.sqrt_density
    }

    /// Dynamic viscosity [kg/(m·s)].
    pub fn viscosity(&self) -> f64 {
        self.viscosity
    }
}

impl Default for AirState {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afn_core::units::{degc, pa};

    #[test]
    fn standard_matches_explicit_construction() {
        let a = AirState::standard();
        let b = AirState::new(20.0, 0.0, 101_325.0).unwrap();
        assert_eq!(a, b);
        assert!((a.sqrt_density() * a.sqrt_density() - a.density()).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_physical_inputs() {
        assert!(AirState::new(f64::NAN, 0.0, 101_325.0).is_err());
        assert!(AirState::new(20.0, -0.001, 101_325.0).is_err());
        assert!(AirState::new(20.0, 0.0, 0.0).is_err());
        assert!(matches!(
            AirState::new(500.0, 0.0, 101_325.0),
            Err(AirError::OutOfRange { .. })
        ));
    }

    #[test]
    fn unit_checked_constructor() {
        let s = AirState::from_conditions(degc(-10.0), 0.001, pa(95_000.0)).unwrap();
        assert!((s.temperature_c() + 10.0).abs() < 1e-9);
        assert!(s.density() > AirState::standard().density() * 0.95);
    }

    #[test]
    fn cold_air_is_denser() {
        let cold = AirState::new(-5.0, 0.002, 101_325.0).unwrap();
        let warm = AirState::new(25.0, 0.008, 101_325.0).unwrap();
        assert!(cold.density() > warm.density());
        assert!(cold.viscosity() < warm.viscosity());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn valid_inputs_give_positive_finite_properties(
                t in -60.0f64..80.0,
                w in 0.0f64..0.03,
                p in 60_000.0f64..110_000.0,
            ) {
                let s = AirState::new(t, w, p).unwrap();
                prop_assert!(s.density().is_finite() && s.density() > 0.0);
                prop_assert!(s.viscosity() > 0.0);
            }
        }
    }
}
