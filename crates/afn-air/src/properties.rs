//! Closed-form moist air relations.

use afn_core::constants::{DRY_AIR_GAS_CONSTANT, KELVIN_OFFSET};

/// Ratio of molecular masses of dry air and water vapour minus one, scaled
/// so that `1 + VAPOUR_FACTOR * w` corrects the dry-air gas constant.
const VAPOUR_FACTOR: f64 = 1.607_768_7;

/// Moist air density [kg/m³] from barometric pressure [Pa], dry-bulb
/// temperature [°C] and humidity ratio [kg/kg].
pub fn moist_air_density(pressure_pa: f64, temperature_c: f64, humidity_ratio: f64) -> f64 {
    pressure_pa
        / (DRY_AIR_GAS_CONSTANT
            * (temperature_c + KELVIN_OFFSET)
            * (1.0 + VAPOUR_FACTOR * humidity_ratio.max(1.0e-5)))
}

/// Dynamic viscosity of air [kg/(m·s)], linear in dry-bulb temperature [°C].
pub fn air_viscosity(temperature_c: f64) -> f64 {
    1.714_32e-5 + 4.828e-8 * temperature_c
}
