//! Solver configuration.

use crate::error::{SolverError, SolverResult};
use crate::initialization::{InitializationType, SolveMode};
use crate::skyline::MatrixForm;

/// Newton driver and linear solver settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Maximum Newton iterations per solve
    pub max_iterations: usize,
    /// Per-node residual relative to the sum of flow magnitudes at the node
    pub relative_tolerance: f64,
    /// Per-node absolute residual (kg/s)
    pub absolute_tolerance: f64,
    /// Ratio of successive corrections below which the step is accelerated
    pub convergence_acceleration_limit: f64,
    /// Largest pressure change applied to a node in one iteration (Pa)
    pub max_pressure_change: f64,
    pub initialization: InitializationType,
    pub mode: SolveMode,
    pub matrix_form: MatrixForm,
    /// Factor a copy of the matrix with leading zero entries trimmed
    pub compress_zero_columns: bool,
    /// Pivots not greater than this times the original diagonal are singular
    pub pivot_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            relative_tolerance: 1e-4,
            absolute_tolerance: 1e-6,
            convergence_acceleration_limit: -0.5,
            max_pressure_change: 500.0,
            initialization: InitializationType::LinearInitialization,
            mode: SolveMode::IterateToConvergence,
            matrix_form: MatrixForm::Symmetric,
            compress_zero_columns: false,
            pivot_tolerance: 1e-12,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> SolverResult<()> {
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations must be at least 1"));
        }
        if !(self.relative_tolerance.is_finite() && self.relative_tolerance >= 0.0) {
            return Err(invalid("relative_tolerance must be finite and >= 0"));
        }
        if !(self.absolute_tolerance.is_finite() && self.absolute_tolerance > 0.0) {
            return Err(invalid("absolute_tolerance must be finite and > 0"));
        }
        if !(self.convergence_acceleration_limit.is_finite()
            && self.convergence_acceleration_limit < 1.0)
        {
            return Err(invalid("convergence_acceleration_limit must be finite and < 1"));
        }
        if !(self.max_pressure_change.is_finite() && self.max_pressure_change > 0.0) {
            return Err(invalid("max_pressure_change must be finite and > 0"));
        }
        if !(self.pivot_tolerance.is_finite() && self.pivot_tolerance >= 0.0) {
            return Err(invalid("pivot_tolerance must be finite and >= 0"));
        }
        Ok(())
    }
}

fn invalid(what: &str) -> SolverError {
    SolverError::InvalidConfig {
        what: what.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let cfg = SolverConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_iterations, 500);
        assert_eq!(cfg.convergence_acceleration_limit, -0.5);
        assert_eq!(cfg.matrix_form, MatrixForm::Symmetric);
        assert!(!cfg.compress_zero_columns);
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = SolverConfig::default();
        cfg.max_iterations = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = SolverConfig::default();
        cfg.absolute_tolerance = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = SolverConfig::default();
        cfg.convergence_acceleration_limit = 1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = SolverConfig::default();
        cfg.max_pressure_change = f64::NAN;
        assert!(cfg.validate().is_err());
    }
}
