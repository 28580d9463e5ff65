//! Error types for solver setup.
//!
//! Numeric failures during a solve are not errors; they are reported through
//! [`crate::SolveStatus`].

use afn_components::ComponentError;
use afn_core::AfnError;
use afn_graph::GraphError;
use thiserror::Error;

/// Errors that stop a run before any solve.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: String },

    #[error("Invalid state: {what}")]
    InvalidState { what: String },

    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for AfnError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::ProblemSetup { what } => AfnError::Invariant { what },
            SolverError::InvalidConfig { .. } => AfnError::InvalidArg {
                what: "solver configuration",
            },
            SolverError::InvalidState { .. } => AfnError::InvalidArg { what: "state" },
            SolverError::Component(e) => e.into(),
            SolverError::Graph(e) => e.into(),
        }
    }
}
