//! Error types for component construction.

use afn_air::AirError;
use afn_core::error::AfnError;
use thiserror::Error;

/// Errors raised while building a component from its parameters.
///
/// Flow evaluation itself never fails; these are configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Value out of range for {what}: {value}")]
    OutOfRange { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Air property error: {message}")]
    Air { message: String },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl From<AirError> for ComponentError {
    fn from(e: AirError) -> Self {
        ComponentError::Air {
            message: e.to_string(),
        }
    }
}

impl From<ComponentError> for AfnError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::NonPhysical { what } => AfnError::InvalidArg { what },
            ComponentError::OutOfRange { what, .. } => AfnError::InvalidArg { what },
            ComponentError::InvalidArg { what } => AfnError::InvalidArg { what },
            ComponentError::Air { message } => AfnError::Invariant { what: message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ComponentError::OutOfRange {
            what: "flow exponent",
            value: 1.5,
        };
        assert!(err.to_string().contains("flow exponent"));
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn error_conversion() {
        let err: AfnError = ComponentError::InvalidArg { what: "test" }.into();
        assert!(matches!(err, AfnError::InvalidArg { .. }));
    }
}
