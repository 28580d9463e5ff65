//! afn-solver: pressure/flow solver for airflow networks.
//!
//! The unknowns are the pressures of non-boundary nodes. Every Newton
//! iteration assembles the Jacobian of the node mass balances into skyline
//! storage, factors it and applies the pressure correction.
//!
//! # Example
//!
//! ```
//! use afn_components::SurfaceCrack;
//! use afn_core::units::pa;
//! use afn_graph::NetworkBuilder;
//! use afn_solver::{SolveStatus, SolverConfig, SolverContext};
//!
//! let mut builder = NetworkBuilder::new();
//! let outdoor = builder.add_external_node("Outdoor", 0.0);
//! let zone = builder.add_zone_node("Zone", 0.0);
//! let leeward = builder.add_external_node("Leeward", 0.0);
//! let crack = builder.add_component("Crack");
//! builder.add_link("Windward crack", outdoor, zone, crack);
//! builder.add_link("Leeward crack", zone, leeward, crack);
//! let network = builder.build().unwrap();
//!
//! let components = vec![SurfaceCrack::new(0.01, 0.65).unwrap().into()];
//! let mut ctx = SolverContext::new(network, components, SolverConfig::default()).unwrap();
//! ctx.set_boundary_pressure(outdoor, pa(5.0)).unwrap();
//!
//! let report = ctx.solve();
//! assert_eq!(report.status, SolveStatus::Converged);
//! assert!((ctx.node_pressure(zone).unwrap().value - 2.5).abs() < 1e-6);
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod initialization;
pub mod jacobian;
pub mod newton;
pub mod skyline;
pub mod solution;
pub mod stack;

pub use config::SolverConfig;
pub use context::SolverContext;
pub use error::{SolverError, SolverResult};
pub use initialization::{InitializationType, SolveMode};
pub use jacobian::{Assembly, AssemblyInput, assemble};
pub use newton::{SolveReport, SolveStatus};
pub use skyline::{MatrixForm, SingularPivot, SkylineMatrix};
pub use solution::{LinkFlow, NetworkSolution};
pub use stack::{compute_stack, link_stack_pressure, stack_pressure};
