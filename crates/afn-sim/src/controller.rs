//! Zone pressure controller.
//!
//! Drives the control signal of a flow-source link (supply, exhaust or
//! constant volume fan) so that a node reaches a pressure setpoint. The
//! control is bracketed in `[0, 1]` and refined by regula falsi with the
//! Illinois modification.

use afn_core::units::Pressure;
use afn_core::{LinkId, NodeId};
use afn_solver::{SolveReport, SolverContext};
use tracing::debug;
use uom::si::pressure::pascal;

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq)]
pub struct PressureController {
    pub node: NodeId,
    pub link: LinkId,
    pub setpoint: Pressure,
    /// Acceptable pressure error (Pa)
    pub tolerance: f64,
    /// Maximum solves per timestep
    pub max_evaluations: usize,
}

/// Result of one controlled solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerOutcome {
    pub control: f64,
    /// Node pressure minus setpoint at `control` (Pa)
    pub pressure_error: f64,
    pub evaluations: usize,
    /// The setpoint lies outside what the link can reach.
    pub saturated: bool,
    pub report: SolveReport,
}

impl PressureController {
    pub fn new(node: NodeId, link: LinkId, setpoint: Pressure) -> Self {
        Self {
            node,
            link,
            setpoint,
            tolerance: 0.01,
            max_evaluations: 30,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Check the controller against the network it will drive.
    pub fn validate(&self, ctx: &SolverContext) -> SimResult<()> {
        let network = ctx.network();
        let node = network
            .node(self.node)
            .ok_or_else(|| invalid(format!("unknown node {}", self.node)))?;
        if node.boundary {
            return Err(invalid(format!(
                "controlled node '{}' is a boundary node",
                node.name
            )));
        }
        let link = network
            .link(self.link)
            .ok_or_else(|| invalid(format!("unknown link {}", self.link)))?;
        let component = ctx
            .component(link.component)
            .ok_or_else(|| invalid(format!("link '{}' has no component", link.name)))?;
        if !component.is_flow_source() {
            return Err(invalid(format!(
                "link '{}' uses a {}, which is not a controllable flow source",
                link.name,
                component.type_name()
            )));
        }
        if !(self.setpoint.get::<pascal>().is_finite()
            && self.tolerance.is_finite()
            && self.tolerance > 0.0
            && self.max_evaluations >= 2)
        {
            return Err(invalid(
                "setpoint and tolerance must be finite, tolerance > 0, at least 2 evaluations"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Solve with the control adjusted to meet the setpoint.
    ///
    /// Stops early when a solve fails; the outcome then carries that report.
    pub fn run(&self, ctx: &mut SolverContext) -> SimResult<ControllerOutcome> {
        let mut evaluations = 0;
        let (mut f_lo, report_lo) = self.evaluate(ctx, 0.0, &mut evaluations)?;
        if !report_lo.status.is_success() || f_lo.abs() <= self.tolerance {
            return Ok(self.outcome(0.0, f_lo, evaluations, false, report_lo));
        }
        let (mut f_hi, report_hi) = self.evaluate(ctx, 1.0, &mut evaluations)?;
        if !report_hi.status.is_success() || f_hi.abs() <= self.tolerance {
            return Ok(self.outcome(1.0, f_hi, evaluations, false, report_hi));
        }

        if f_lo.signum() == f_hi.signum() {
            // Unreachable setpoint: settle on the closer end.
            if f_lo.abs() < f_hi.abs() {
                let (f, report) = self.evaluate(ctx, 0.0, &mut evaluations)?;
                return Ok(self.outcome(0.0, f, evaluations, true, report));
            }
            return Ok(self.outcome(1.0, f_hi, evaluations, true, report_hi));
        }

        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        let mut side = 0i8;
        let mut last = (1.0, f_hi, report_hi);
        while evaluations < self.max_evaluations {
            let u = ((lo * f_hi - hi * f_lo) / (f_hi - f_lo)).clamp(lo, hi);
            let (f, report) = self.evaluate(ctx, u, &mut evaluations)?;
            last = (u, f, report);
            debug!(control = u, error = f, "pressure controller step");
            if !report.status.is_success() || f.abs() <= self.tolerance {
                break;
            }
            if f.signum() == f_lo.signum() {
                lo = u;
                f_lo = f;
                if side == -1 {
                    f_hi *= 0.5;
                }
                side = -1;
            } else {
                hi = u;
                f_hi = f;
                if side == 1 {
                    f_lo *= 0.5;
                }
                side = 1;
            }
        }
        let (u, f, report) = last;
        Ok(self.outcome(u, f, evaluations, false, report))
    }

    fn evaluate(
        &self,
        ctx: &mut SolverContext,
        u: f64,
        evaluations: &mut usize,
    ) -> SimResult<(f64, SolveReport)> {
        ctx.set_link_control(self.link, u)?;
        let report = ctx.solve();
        *evaluations += 1;
        let p = ctx.node_pressure(self.node).map_or(f64::NAN, |p| p.get::<pascal>());
        Ok((p - self.setpoint.get::<pascal>(), report))
    }

    fn outcome(
        &self,
        control: f64,
        pressure_error: f64,
        evaluations: usize,
        saturated: bool,
        report: SolveReport,
    ) -> ControllerOutcome {
        ControllerOutcome {
            control,
            pressure_error,
            evaluations,
            saturated,
            report,
        }
    }
}

fn invalid(what: String) -> SimError {
    SimError::InvalidController { what }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afn_components::{Component, SurfaceCrack, ZoneExhaustFan};
    use afn_core::units::{m3ps, pa};
    use afn_graph::NetworkBuilder;
    use afn_solver::SolverConfig;

    fn house() -> (SolverContext, NodeId, LinkId, LinkId) {
        let mut b = NetworkBuilder::new();
        let out = b.add_external_node("Out", 0.0);
        let zone = b.add_zone_node("Zone", 0.0);
        let crack = b.add_component("Crack");
        let fan = b.add_component("Exhaust");
        let leak = b.add_link("Leak", out, zone, crack);
        let exhaust = b.add_link("Exhaust", zone, out, fan);
        let net = b.build().unwrap();
        let closed = SurfaceCrack::new(1e-4, 0.65).unwrap();
        let comps: Vec<Component> = vec![
            SurfaceCrack::new(0.02, 0.65).unwrap().into(),
            ZoneExhaustFan::new(m3ps(0.1), closed).unwrap().into(),
        ];
        let ctx = SolverContext::new(net, comps, SolverConfig::default()).unwrap();
        (ctx, zone, leak, exhaust)
    }

    #[test]
    fn reaches_reachable_setpoint() {
        let (mut ctx, zone, _, exhaust) = house();
        let ctl = PressureController::new(zone, exhaust, pa(-2.0)).with_tolerance(1e-3);
        ctl.validate(&ctx).unwrap();
        let out = ctl.run(&mut ctx).unwrap();
        assert!(out.report.status.is_converged(), "{out:?}");
        assert!(!out.saturated);
        assert!(out.pressure_error.abs() <= 1e-3);
        assert!(out.control > 0.0 && out.control < 1.0);
        assert!((ctx.node_pressure(zone).unwrap().value + 2.0).abs() <= 1e-3);
    }

    #[test]
    fn saturates_when_unreachable() {
        let (mut ctx, zone, _, exhaust) = house();
        let ctl = PressureController::new(zone, exhaust, pa(-500.0));
        let out = ctl.run(&mut ctx).unwrap();
        assert!(out.saturated);
        assert_eq!(out.control, 1.0);
        assert_eq!(out.evaluations, 2);
    }

    #[test]
    fn counts_every_solve() {
        let (mut ctx, zone, _, exhaust) = house();
        let ctl = PressureController::new(zone, exhaust, pa(-2.0)).with_tolerance(1e-3);
        let out = ctl.run(&mut ctx).unwrap();
        assert!(out.evaluations > 2, "{out:?}");
        assert!(out.evaluations <= ctl.max_evaluations);

        let mut capped = ctl.clone();
        capped.max_evaluations = 3;
        capped.tolerance = 1e-12;
        let (mut ctx, _, _, _) = house();
        let out = capped.run(&mut ctx).unwrap();
        assert_eq!(out.evaluations, 3);
    }

    #[test]
    fn rejects_pressure_driven_links_and_boundary_nodes() {
        let (ctx, zone, leak, exhaust) = house();
        let ctl = PressureController::new(zone, leak, pa(-2.0));
        assert!(ctl.validate(&ctx).is_err());
        let out = afn_core::NodeId::from_index(0);
        let ctl = PressureController::new(out, exhaust, pa(-2.0));
        assert!(ctl.validate(&ctx).is_err());
    }
}
