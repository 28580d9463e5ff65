//! Outdoor and zone conditions supplied each timestep.

use afn_air::AirState;
use afn_core::units::{Pressure, Temperature, Velocity, degc, mps, pa, to_degc};
use afn_core::constants::STANDARD_PRESSURE_PA;
use uom::si::velocity::meter_per_second;

use crate::error::{SimError, SimResult};

/// Weather for one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub outdoor_dry_bulb: Temperature,
    /// kg water / kg dry air
    pub humidity_ratio: f64,
    pub barometric_pressure: Pressure,
    /// Wind speed at the meteorological station
    pub wind_speed: Velocity,
    /// Direction the wind blows from, degrees clockwise from north
    pub wind_direction_deg: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            outdoor_dry_bulb: degc(20.0),
            humidity_ratio: 0.0,
            barometric_pressure: pa(STANDARD_PRESSURE_PA),
            wind_speed: mps(0.0),
            wind_direction_deg: 0.0,
        }
    }
}

impl Environment {
    /// Calm weather at the given temperature and standard pressure.
    pub fn still(outdoor_dry_bulb: Temperature) -> Self {
        Self {
            outdoor_dry_bulb,
            ..Self::default()
        }
    }

    pub fn with_wind(mut self, speed: Velocity, direction_deg: f64) -> Self {
        self.wind_speed = speed;
        self.wind_direction_deg = direction_deg;
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        let wind_speed = self.wind_speed.get::<meter_per_second>();
        if !(wind_speed.is_finite() && wind_speed >= 0.0) {
            return Err(SimError::InvalidArg {
                what: "wind speed must be finite and >= 0",
            });
        }
        if !self.wind_direction_deg.is_finite() {
            return Err(SimError::InvalidArg {
                what: "wind direction must be finite",
            });
        }
        self.outdoor_air()?;
        Ok(())
    }

    /// Outdoor air state; its density is the ambient density of the stack
    /// terms.
    pub fn outdoor_air(&self) -> SimResult<AirState> {
        Ok(AirState::from_conditions(
            self.outdoor_dry_bulb,
            self.humidity_ratio,
            self.barometric_pressure,
        )?)
    }

    pub fn outdoor_dry_bulb_c(&self) -> f64 {
        to_degc(self.outdoor_dry_bulb)
    }
}

/// Air condition of one zone for one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneConditions {
    pub temperature: Temperature,
    pub humidity_ratio: f64,
}

impl ZoneConditions {
    pub fn new(temperature: Temperature, humidity_ratio: f64) -> Self {
        Self {
            temperature,
            humidity_ratio,
        }
    }

    /// Air state at the site barometric pressure.
    pub fn air(&self, barometric_pressure: Pressure) -> SimResult<AirState> {
        Ok(AirState::from_conditions(
            self.temperature,
            self.humidity_ratio,
            barometric_pressure,
        )?)
    }
}
