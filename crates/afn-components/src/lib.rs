//! afn-components: flow elements of the airflow network.
//!
//! Every element maps a pressure difference across a link to a mass flow and
//! its derivative:
//! - leakage paths (surface cracks, effective leakage area and ratio)
//! - large openings (simple, detailed, horizontal)
//! - ducts and duct-like elements (heat exchangers, coils)
//! - dampers and constant pressure drops
//! - fans (curve based, constant volume, zone exhaust) and flow sources
//!
//! Elements validate their parameters on construction and are pure functions
//! afterwards; `Component` is the sum type the solver stores per link.
//!
//! # Example
//!
//! ```
//! use afn_air::AirState;
//! use afn_components::{Component, FlowInput, SurfaceCrack};
//!
//! let crack: Component = SurfaceCrack::new(0.01, 0.65).unwrap().into();
//! let air = AirState::standard();
//! let flow = crack.calculate(&FlowInput::new(5.0, &air, &air));
//! assert!(flow.net() > 0.0);
//! ```

pub mod common;
pub mod component;
pub mod crack;
pub mod damper;
pub mod duct;
pub mod error;
pub mod fan;
pub mod horizontal;
pub mod leakage;
pub mod opening;
pub mod pressure_drop;
pub mod source;
pub mod traits;

pub use component::Component;
pub use crack::SurfaceCrack;
pub use damper::Damper;
pub use duct::{Coil, Duct, HeatExchanger};
pub use error::{ComponentError, ComponentResult};
pub use fan::{ConstantVolumeFan, DetailedFan, FanCurve, ZoneExhaustFan};
pub use horizontal::HorizontalOpening;
pub use leakage::{EffectiveLeakageArea, EffectiveLeakageRatio};
pub use opening::{DetailedOpening, OpeningFactorPoint, SimpleOpening};
pub use pressure_drop::ConstantPressureDrop;
pub use source::{SpecifiedMassFlow, SpecifiedVolumeFlow};
pub use traits::{ComponentFlow, FlowElement, FlowInput};
