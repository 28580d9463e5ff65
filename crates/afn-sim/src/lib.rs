//! afn-sim: timestep driver for airflow networks.
//!
//! Wraps a [`afn_solver::SolverContext`] with the per-timestep inputs a
//! building simulation supplies:
//! - weather, turned into outdoor air states and wind pressures on facades
//! - zone air states and link control signals
//! - an optional zone pressure controller acting on a fan or flow source
//!
//! Recurring numerical problems are counted and logged a limited number of
//! times; see [`Diagnostics`].
//!
//! # Example
//!
//! ```
//! use afn_components::{Component, SurfaceCrack};
//! use afn_core::units::{degc, mps};
//! use afn_graph::NetworkBuilder;
//! use afn_sim::{AirflowNetwork, CpCurve, Environment, FacadeWind, SimulationOptions};
//! use afn_solver::{SolverConfig, SolverContext};
//!
//! let mut b = NetworkBuilder::new();
//! let north = b.add_external_node("North", 0.0);
//! let south = b.add_external_node("South", 0.0);
//! let zone = b.add_zone_node("Zone", 0.0);
//! let crack = b.add_component("Crack");
//! b.add_link("N", north, zone, crack);
//! b.add_link("S", zone, south, crack);
//! let net = b.build().unwrap();
//! let comps: Vec<Component> = vec![SurfaceCrack::new(0.01, 0.65).unwrap().into()];
//! let ctx = SolverContext::new(net, comps, SolverConfig::default()).unwrap();
//!
//! let mut afn = AirflowNetwork::new(ctx, SimulationOptions::default()).unwrap();
//! let walls = afn.add_cp_curve(CpCurve::low_rise("Walls", 1.0).unwrap());
//! for (node, azimuth_deg) in [(north, 0.0), (south, 180.0)] {
//!     afn.add_facade(FacadeWind { node, curve: walls, azimuth_deg, height: 3.0 })
//!         .unwrap();
//! }
//! afn.update_boundaries(&Environment::still(degc(5.0)).with_wind(mps(5.0), 0.0))
//!     .unwrap();
//! let report = afn.simulate_timestep().unwrap();
//! assert!(report.status.is_converged());
//! ```

pub mod controller;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod network;
pub mod wind;

pub use controller::{ControllerOutcome, PressureController};
pub use diagnostics::{Diagnostics, RecurringWarning, WarningKind};
pub use environment::{Environment, ZoneConditions};
pub use error::{SimError, SimResult};
pub use network::{AirflowNetwork, SimulationOptions};
pub use wind::{CpAngleBasis, CpCurve, FacadeWind, WindProfile, wind_pressure};
