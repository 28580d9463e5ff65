//! Newton iteration driver.
//!
//! Each iteration assembles the Jacobian at the current pressures, checks
//! every unknown node's mass balance, factors and solves for the pressure
//! correction and applies it with per-node acceleration and a step cap.

use afn_core::NodeId;
use tracing::debug;

use crate::context::{SolverContext, StartState};
use crate::initialization::SolveMode;
use crate::skyline::SingularPivot;

/// Outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveStatus {
    /// Every unknown node satisfies the mass balance tolerances.
    Converged,
    /// The laminar pass ran and `SolveMode::InitializationOnly` stopped there.
    Initialized,
    /// The iteration limit was reached.
    NotConverged,
    /// Factorization rejected the pivot of `equation`, owned by `node`.
    Singular { node: NodeId, equation: usize },
}

impl SolveStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, SolveStatus::Converged)
    }

    /// Whether the pressures are usable as a solution.
    pub fn is_success(&self) -> bool {
        matches!(self, SolveStatus::Converged | SolveStatus::Initialized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Converged => "converged",
            SolveStatus::Initialized => "initialized",
            SolveStatus::NotConverged => "not converged",
            SolveStatus::Singular { .. } => "singular",
        }
    }
}

/// Summary of one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub status: SolveStatus,
    /// Solve passes, the laminar pass included
    pub iterations: usize,
    /// Largest mass balance residual over unknown nodes (kg/s)
    pub max_residual: f64,
    /// Node with the largest residual
    pub worst_node: Option<NodeId>,
}

struct ResidualCheck {
    converged: bool,
    max_residual: f64,
    worst_equation: Option<usize>,
}

impl SolverContext {
    /// Solve for the unknown node pressures.
    ///
    /// Numeric failures are reported through [`SolveStatus`]; pressures keep
    /// the last iterate and link flows are evaluated at those pressures.
    pub fn solve(&mut self) -> SolveReport {
        let report = self.run();
        self.record_link_flows();
        self.start = StartState::Warm;
        self.last_report = Some(report);
        report
    }

    fn run(&mut self) -> SolveReport {
        self.update_stack();
        if self.start == StartState::Cold {
            self.zero_unknown_pressures();
        }
        self.previous_correction.fill(0.0);

        self.assemble_in_place(false);
        if self.equations.is_empty() {
            return self.report(SolveStatus::Converged, 0, &self.check_residuals());
        }
        let check = self.check_residuals();
        if check.converged {
            // Converged pressures still need a regular Jacobian.
            if let Err(pivot) = self.factor_and_solve() {
                return self.singular(pivot, 0, &check);
            }
            return self.report(SolveStatus::Converged, 0, &check);
        }

        let mut iterations = 0;
        let init_only = self.config.mode == SolveMode::InitializationOnly;
        if self.config.initialization.uses_linear_pass() || init_only {
            self.assemble_in_place(true);
            let linear_check = self.check_residuals();
            if let Err(pivot) = self.factor_and_solve() {
                self.assemble_in_place(false);
                return self.singular(pivot, iterations, &linear_check);
            }
            self.apply_full_step();
            iterations += 1;
            debug!(
                init = self.config.initialization.as_str(),
                "laminar initialization pass done"
            );
            if init_only {
                self.assemble_in_place(false);
                let check = self.check_residuals();
                return self.report(SolveStatus::Initialized, iterations, &check);
            }
        }

        loop {
            self.assemble_in_place(false);
            let check = self.check_residuals();
            debug!(
                iteration = iterations,
                max_residual = check.max_residual,
                "newton iteration"
            );
            if check.converged {
                return self.report(SolveStatus::Converged, iterations, &check);
            }
            if iterations >= self.config.max_iterations {
                return self.report(SolveStatus::NotConverged, iterations, &check);
            }
            if let Err(pivot) = self.factor_and_solve() {
                return self.singular(pivot, iterations, &check);
            }
            self.apply_correction();
            iterations += 1;
        }
    }

    fn zero_unknown_pressures(&mut self) {
        for eq in 0..self.equations.len() {
            if let Some(node) = self.equations.node(eq) {
                self.pressures[node.index()] = 0.0;
            }
        }
    }

    /// Per-node convergence: `|R| <= abs_tol` or `|R| <= rel_tol * Σ|F|`.
    fn check_residuals(&self) -> ResidualCheck {
        let abs_tol = self.config.absolute_tolerance;
        let rel_tol = self.config.relative_tolerance;
        let mut check = ResidualCheck {
            converged: true,
            max_residual: 0.0,
            worst_equation: None,
        };
        let residual = &self.assembly.residual;
        let characteristic = &self.assembly.characteristic;
        for (eq, (r, c)) in residual.iter().zip(characteristic).enumerate() {
            let r = r.abs();
            if r > abs_tol && r > rel_tol * c {
                check.converged = false;
            }
            if check.worst_equation.is_none() || r > check.max_residual {
                check.max_residual = r;
                check.worst_equation = Some(eq);
            }
        }
        check
    }

    /// Factor the assembled matrix and leave the correction in
    /// `self.correction`.
    fn factor_and_solve(&mut self) -> Result<(), SingularPivot> {
        let tol = self.config.pivot_tolerance;
        self.correction.copy_from_slice(&self.assembly.residual);
        if self.config.compress_zero_columns {
            self.assembly.matrix.compress_into(&mut self.compressed);
            self.compressed.factor(tol)?;
            self.compressed.solve(&mut self.correction);
        } else {
            self.assembly.matrix.factor(tol)?;
            self.assembly.matrix.solve(&mut self.correction);
        }
        Ok(())
    }

    /// Laminar pass update: the whole correction, no cap.
    fn apply_full_step(&mut self) {
        for (eq, delta) in self.correction.iter().enumerate() {
            if let Some(node) = self.equations.node(eq) {
                self.pressures[node.index()] -= delta;
            }
        }
    }

    /// `P -= cef * Δ` with `cef = 1 / (1 - c)` when the ratio `c` of this
    /// correction to the previous one is below the acceleration limit.
    fn apply_correction(&mut self) {
        let limit = self.config.convergence_acceleration_limit;
        let cap = self.config.max_pressure_change;
        for eq in 0..self.correction.len() {
            let delta = self.correction[eq];
            let previous = self.previous_correction[eq];
            let mut cef = 1.0;
            if previous != 0.0 {
                let c = delta / previous;
                if c < limit {
                    cef = 1.0 / (1.0 - c);
                }
            }
            let step = (cef * delta).clamp(-cap, cap);
            if let Some(node) = self.equations.node(eq) {
                self.pressures[node.index()] -= step;
            }
            self.previous_correction[eq] = delta;
        }
    }

    fn singular(&self, pivot: SingularPivot, iterations: usize, check: &ResidualCheck) -> SolveReport {
        let status = match self.equations.node(pivot.equation) {
            Some(node) => SolveStatus::Singular {
                node,
                equation: pivot.equation,
            },
            None => SolveStatus::NotConverged,
        };
        debug!(
            equation = pivot.equation,
            pivot = pivot.pivot,
            "singular pivot"
        );
        self.report(status, iterations, check)
    }

    fn report(&self, status: SolveStatus, iterations: usize, check: &ResidualCheck) -> SolveReport {
        SolveReport {
            status,
            iterations,
            max_residual: check.max_residual,
            worst_node: check.worst_equation.and_then(|eq| self.equations.node(eq)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{SolveStatus, SolverConfig, SolverContext};
    use afn_components::{Component, SurfaceCrack};
    use afn_core::units::pa;
    use afn_graph::NetworkBuilder;

    fn crack() -> Component {
        SurfaceCrack::new(0.01, 0.65).unwrap().into()
    }

    #[test]
    fn status_names() {
        assert_eq!(SolveStatus::Converged.as_str(), "converged");
        assert!(SolveStatus::Initialized.is_success());
        assert!(!SolveStatus::NotConverged.is_success());
    }

    #[test]
    fn boundary_only_network_is_trivially_converged() {
        let mut b = NetworkBuilder::new();
        let a = b.add_external_node("A", 0.0);
        let z = b.add_external_node("B", 0.0);
        let c = b.add_component("Crack");
        let l = b.add_link("L", a, z, c);
        let net = b.build().unwrap();
        let mut ctx = SolverContext::new(net, vec![crack()], SolverConfig::default()).unwrap();
        ctx.set_boundary_pressure(a, pa(5.0)).unwrap();
        let report = ctx.solve();
        assert_eq!(report.status, SolveStatus::Converged);
        assert_eq!(report.iterations, 0);
        let expected = 0.01 * 5f64.powf(0.65);
        assert!((ctx.link_flow(l).unwrap().net - expected).abs() < 1e-12);
    }

    #[test]
    fn initialization_only_stops_after_laminar_pass() {
        let mut b = NetworkBuilder::new();
        let a = b.add_external_node("A", 0.0);
        let z = b.add_zone_node("Z", 0.0);
        let o = b.add_external_node("O", 0.0);
        let c = b.add_component("Crack");
        b.add_link("AZ", a, z, c);
        b.add_link("ZO", z, o, c);
        let net = b.build().unwrap();
        let config = SolverConfig {
            mode: crate::SolveMode::InitializationOnly,
            ..SolverConfig::default()
        };
        let mut ctx = SolverContext::new(net, vec![crack()], config).unwrap();
        ctx.set_boundary_pressure(a, pa(10.0)).unwrap();
        let report = ctx.solve();
        assert_eq!(report.status, SolveStatus::Initialized);
        assert_eq!(report.iterations, 1);
        // Identical laminar conductances put the zone half way.
        assert!((ctx.node_pressure(z).unwrap().value - 5.0).abs() < 1e-9);
    }

    #[test]
    fn iteration_limit_is_reported() {
        let mut b = NetworkBuilder::new();
        let a = b.add_external_node("A", 0.0);
        let z = b.add_zone_node("Z", 0.0);
        let o = b.add_external_node("O", 0.0);
        let c1 = b.add_component("Tight");
        let c2 = b.add_component("Loose");
        b.add_link("AZ", a, z, c1);
        b.add_link("ZO", z, o, c2);
        let net = b.build().unwrap();
        let config = SolverConfig {
            max_iterations: 1,
            initialization: crate::InitializationType::ZeroNodePressures,
            absolute_tolerance: 1e-14,
            relative_tolerance: 0.0,
            ..SolverConfig::default()
        };
        let comps = vec![
            SurfaceCrack::new(0.001, 0.5).unwrap().into(),
            SurfaceCrack::new(0.05, 0.9).unwrap().into(),
        ];
        let mut ctx = SolverContext::new(net, comps, config).unwrap();
        ctx.set_boundary_pressure(a, pa(50.0)).unwrap();
        let report = ctx.solve();
        assert_eq!(report.status, SolveStatus::NotConverged);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.worst_node, Some(z));
    }
}
