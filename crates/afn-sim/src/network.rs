//! Timestep driver around a solver context.

use afn_core::units::{Pressure, pa};
use afn_core::{LinkId, NodeId};
use afn_graph::NodeKind;
use afn_solver::{LinkFlow, NetworkSolution, SolveReport, SolveStatus, SolverContext};
use tracing::{debug, info};
use uom::si::velocity::meter_per_second;

use crate::controller::{ControllerOutcome, PressureController};
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::environment::{Environment, ZoneConditions};
use crate::error::{SimError, SimResult};
use crate::wind::{CpCurve, FacadeWind, WindProfile, wind_pressure};

/// Run-level options of the timestep driver.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOptions {
    /// Physical-range violations are errors instead of warnings.
    pub strict: bool,
    /// Largest plausible node pressure magnitude (Pa)
    pub max_node_pressure: f64,
    /// Largest plausible link mass flow magnitude (kg/s)
    pub max_link_flow: f64,
    /// Occurrences of each recurring warning that are logged
    pub warning_limit: usize,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_node_pressure: 1.0e4,
            max_link_flow: 100.0,
            warning_limit: 5,
        }
    }
}

impl SimulationOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.max_node_pressure.is_finite() && self.max_node_pressure > 0.0) {
            return Err(SimError::InvalidArg {
                what: "max_node_pressure must be finite and > 0",
            });
        }
        if !(self.max_link_flow.is_finite() && self.max_link_flow > 0.0) {
            return Err(SimError::InvalidArg {
                what: "max_link_flow must be finite and > 0",
            });
        }
        Ok(())
    }
}

/// An airflow network stepped through time.
///
/// Collaborators push weather, zone air states and link controls, call
/// [`simulate_timestep`](Self::simulate_timestep) and read back flows.
#[derive(Debug)]
pub struct AirflowNetwork {
    context: SolverContext,
    cp_curves: Vec<CpCurve>,
    facades: Vec<FacadeWind>,
    wind_profile: WindProfile,
    controller: Option<PressureController>,
    options: SimulationOptions,
    diagnostics: Diagnostics,
    environment: Environment,
    timestep: usize,
    last_report: Option<SolveReport>,
    last_controller: Option<ControllerOutcome>,
}

impl AirflowNetwork {
    pub fn new(context: SolverContext, options: SimulationOptions) -> SimResult<Self> {
        options.validate()?;
        let mut network = Self {
            context,
            cp_curves: Vec::new(),
            facades: Vec::new(),
            wind_profile: WindProfile::default(),
            controller: None,
            diagnostics: Diagnostics::new(options.warning_limit),
            options,
            environment: Environment::default(),
            timestep: 0,
            last_report: None,
            last_controller: None,
        };
        let env = network.environment;
        network.update_boundaries(&env)?;
        Ok(network)
    }

    /// Register a pressure coefficient curve and return its index.
    pub fn add_cp_curve(&mut self, curve: CpCurve) -> usize {
        self.cp_curves.push(curve);
        self.cp_curves.len() - 1
    }

    /// Expose an external node to the wind.
    pub fn add_facade(&mut self, facade: FacadeWind) -> SimResult<()> {
        let node = self
            .context
            .network()
            .node(facade.node)
            .ok_or_else(|| SimError::InvalidWind {
                what: format!("unknown node {}", facade.node),
            })?;
        if !node.boundary || node.kind != NodeKind::External {
            return Err(SimError::InvalidWind {
                what: format!("node '{}' is not an external boundary node", node.name),
            });
        }
        if facade.curve >= self.cp_curves.len() {
            return Err(SimError::InvalidWind {
                what: format!("node '{}' refers to missing curve {}", node.name, facade.curve),
            });
        }
        if !(facade.azimuth_deg.is_finite() && facade.height.is_finite()) {
            return Err(SimError::InvalidWind {
                what: format!("node '{}' has a non-finite azimuth or height", node.name),
            });
        }
        if let Some(existing) = self.facades.iter_mut().find(|f| f.node == facade.node) {
            *existing = facade;
        } else {
            self.facades.push(facade);
        }
        Ok(())
    }

    pub fn set_wind_profile(&mut self, profile: WindProfile) -> SimResult<()> {
        profile.validate()?;
        self.wind_profile = profile;
        Ok(())
    }

    pub fn set_pressure_controller(&mut self, controller: PressureController) -> SimResult<()> {
        controller.validate(&self.context)?;
        self.controller = Some(controller);
        Ok(())
    }

    /// Apply the weather of the coming timestep: outdoor air on external
    /// nodes, ambient density and wind pressures on facade nodes.
    pub fn update_boundaries(&mut self, environment: &Environment) -> SimResult<()> {
        environment.validate()?;
        let outdoor = environment.outdoor_air()?;
        let density = outdoor.density();
        self.context.set_ambient_density(density)?;

        let externals: Vec<NodeId> = self
            .context
            .network()
            .nodes()
            .iter()
            .filter(|n| n.kind == NodeKind::External)
            .map(|n| n.id)
            .collect();
        for node in externals {
            self.context.set_node_air(node, outdoor)?;
        }

        for facade in &self.facades {
            let curve = &self.cp_curves[facade.curve];
            let cp = curve.coefficient(environment.wind_direction_deg, facade.azimuth_deg);
            let speed = self
                .wind_profile
                .speed_at(environment.wind_speed.get::<meter_per_second>(), facade.height);
            let pw = wind_pressure(cp, density, speed);
            self.context.set_boundary_pressure(facade.node, pa(pw))?;
        }
        self.environment = *environment;
        Ok(())
    }

    /// Air state of a zone for the coming timestep, at the current site
    /// barometric pressure.
    pub fn set_zone_conditions(
        &mut self,
        node: NodeId,
        conditions: &ZoneConditions,
    ) -> SimResult<()> {
        let air = conditions.air(self.environment.barometric_pressure)?;
        self.context.set_node_air(node, air)?;
        Ok(())
    }

    pub fn set_link_control(&mut self, link: LinkId, control: f64) -> SimResult<()> {
        Ok(self.context.set_link_control(link, control)?)
    }

    pub fn set_boundary_pressure(&mut self, node: NodeId, pressure: Pressure) -> SimResult<()> {
        Ok(self.context.set_boundary_pressure(node, pressure)?)
    }

    /// Solve the current timestep.
    ///
    /// Numerical failures are reported in the returned status and counted
    /// as recurring warnings. Out-of-range results are warnings too, or an
    /// error in strict mode.
    pub fn simulate_timestep(&mut self) -> SimResult<SolveReport> {
        self.timestep += 1;
        let report = match &self.controller {
            Some(controller) => {
                let outcome = controller.run(&mut self.context)?;
                debug!(
                    control = outcome.control,
                    error = outcome.pressure_error,
                    evaluations = outcome.evaluations,
                    saturated = outcome.saturated,
                    "pressure controller"
                );
                self.last_controller = Some(outcome);
                outcome.report
            }
            None => self.context.solve(),
        };
        self.last_report = Some(report);

        let step = self.timestep;
        match report.status {
            SolveStatus::NotConverged => {
                self.diagnostics
                    .record(WarningKind::NotConverged, report.max_residual, || {
                        format!(
                            "timestep {step}: solver did not converge after {} iterations, max residual {:.3e} kg/s",
                            report.iterations, report.max_residual
                        )
                    });
            }
            SolveStatus::Singular { node, equation } => {
                let name = self.node_name(node);
                self.diagnostics
                    .record(WarningKind::SingularMatrix, equation as f64, || {
                        format!("timestep {step}: singular matrix at node '{name}'")
                    });
            }
            SolveStatus::Converged | SolveStatus::Initialized => {}
        }

        if report.status.is_success() {
            self.check_ranges()?;
        }

        info!(
            timestep = step,
            status = report.status.as_str(),
            iterations = report.iterations,
            max_residual = report.max_residual,
            "airflow network solved"
        );
        Ok(report)
    }

    fn check_ranges(&mut self) -> SimResult<()> {
        let step = self.timestep;
        let limit = self.options.max_node_pressure;
        for node in self.context.network().nodes() {
            let p = self.context.pressures()[node.id.index()];
            if p.abs() > limit {
                let what = format!(
                    "timestep {step}: pressure {p:.1} Pa at node '{}' exceeds {limit} Pa",
                    node.name
                );
                if self.options.strict {
                    return Err(SimError::PhysicalRange { what });
                }
                self.diagnostics
                    .record(WarningKind::PressureOutOfRange, p, || what);
            }
        }
        let limit = self.options.max_link_flow;
        for link in self.context.network().links() {
            let Some(flow) = self.context.link_flow(link.id) else {
                continue;
            };
            if flow.net.abs() > limit {
                let what = format!(
                    "timestep {step}: flow {:.3} kg/s through link '{}' exceeds {limit} kg/s",
                    flow.net, link.name
                );
                if self.options.strict {
                    return Err(SimError::PhysicalRange { what });
                }
                self.diagnostics
                    .record(WarningKind::FlowOutOfRange, flow.net, || what);
            }
        }
        Ok(())
    }

    /// Start a new run: pressures, warm start, results and counters go back
    /// to their initial state. Inputs are kept.
    pub fn clear_state(&mut self) {
        self.context.reset();
        self.diagnostics.reset();
        self.timestep = 0;
        self.last_report = None;
        self.last_controller = None;
    }

    fn node_name(&self, node: NodeId) -> String {
        self.context
            .network()
            .node(node)
            .map_or_else(|| node.to_string(), |n| n.name.clone())
    }

    pub fn context(&self) -> &SolverContext {
        &self.context
    }

    pub fn options(&self) -> &SimulationOptions {
        &self.options
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn cp_curves(&self) -> &[CpCurve] {
        &self.cp_curves
    }

    pub fn facades(&self) -> &[FacadeWind] {
        &self.facades
    }

    pub fn wind_profile(&self) -> &WindProfile {
        &self.wind_profile
    }

    pub fn pressure_controller(&self) -> Option<&PressureController> {
        self.controller.as_ref()
    }

    pub fn timestep(&self) -> usize {
        self.timestep
    }

    pub fn last_report(&self) -> Option<&SolveReport> {
        self.last_report.as_ref()
    }

    pub fn last_controller_outcome(&self) -> Option<&ControllerOutcome> {
        self.last_controller.as_ref()
    }

    pub fn node_pressure(&self, node: NodeId) -> Option<Pressure> {
        self.context.node_pressure(node)
    }

    pub fn link_flow(&self, link: LinkId) -> Option<&LinkFlow> {
        self.context.link_flow(link)
    }

    pub fn link_flows(&self) -> &[LinkFlow] {
        self.context.link_flows()
    }

    pub fn solution(&self) -> Option<NetworkSolution> {
        self.context.solution()
    }
}
