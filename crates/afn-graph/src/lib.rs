//! afn-graph: network topology store for the airflow network.
//!
//! Provides:
//! - Node, link and component-slot tables (`Network`)
//! - Incremental builder with validation
//! - Equation numbering that excludes boundary nodes
//!
//! # Example
//!
//! ```
//! use afn_graph::NetworkBuilder;
//!
//! let mut builder = NetworkBuilder::new();
//! let outdoor = builder.add_external_node("Outdoor", 0.0);
//! let zone = builder.add_zone_node("Living", 0.0);
//! let crack = builder.add_component("Wall crack");
//! builder.add_link("Crack 1", outdoor, zone, crack);
//! let network = builder.build().unwrap();
//!
//! assert_eq!(network.nodes().len(), 2);
//! assert_eq!(network.unknown_count(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod indexing;
pub mod network;
pub(crate) mod validate;

pub use builder::NetworkBuilder;
pub use error::{GraphError, GraphResult};
pub use indexing::EquationMap;
pub use network::{ComponentSlot, Link, Network, Node, NodeKind};
