//! afn-air: moist air states for airflow network component models.
//!
//! Component flow equations need the density, its square root and the
//! dynamic viscosity of the air on each side of a link. This crate derives
//! those from dry-bulb temperature, humidity ratio and barometric pressure.

pub mod error;
pub mod properties;
pub mod state;

pub use error::{AirError, AirResult};
pub use properties::{air_viscosity, moist_air_density};
pub use state::AirState;
