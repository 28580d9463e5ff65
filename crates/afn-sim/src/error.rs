//! Error types for timestep simulation.

use thiserror::Error;

/// Errors raised while configuring or stepping an airflow network.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid pressure coefficient curve: {what}")]
    InvalidCurve { what: String },

    #[error("Invalid wind setup: {what}")]
    InvalidWind { what: String },

    #[error("Invalid controller: {what}")]
    InvalidController { what: String },

    /// A solved pressure or flow is outside the configured sanity limits.
    #[error("Physical range exceeded: {what}")]
    PhysicalRange { what: String },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<afn_solver::SolverError> for SimError {
    fn from(e: afn_solver::SolverError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<afn_components::ComponentError> for SimError {
    fn from(e: afn_components::ComponentError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<afn_air::AirError> for SimError {
    fn from(e: afn_air::AirError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<afn_graph::GraphError> for SimError {
    fn from(e: afn_graph::GraphError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<afn_core::AfnError> for SimError {
    fn from(e: afn_core::AfnError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}
