//! afn-core: shared foundation for the airflow network crates.
//!
//! Contains:
//! - units (uom SI types, constructors and physical constants)
//! - numeric (Real, tolerances, float helpers)
//! - ids (typed compact ids for nodes, links and components)
//! - error (shared error type)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{AfnError, AfnResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
