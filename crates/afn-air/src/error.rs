//! Air property errors.

use afn_core::AfnError;
use thiserror::Error;

/// Result type for air property operations.
pub type AirResult<T> = Result<T, AirError>;

/// Errors raised when an air state cannot be formed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AirError {
    /// Non-physical value (negative pressure, humidity ratio, ...).
    #[error("Non-physical value for {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },

    /// Value outside the range the correlations cover.
    #[error("Value out of range for {what}: {value}")]
    OutOfRange { what: &'static str, value: f64 },
}

impl From<AirError> for AfnError {
    fn from(err: AirError) -> Self {
        match err {
            AirError::NonPhysical { what, value } | AirError::OutOfRange { what, value } => {
                if value.is_finite() {
                    AfnError::InvalidArg { what }
                } else {
                    AfnError::NonFinite { what, value }
                }
            }
        }
    }
}
