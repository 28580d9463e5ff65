//! Solver context: the network, its components and every array a solve
//! touches, allocated once per topology.

use afn_air::AirState;
use afn_components::Component;
use afn_core::units::{Pressure, pa};
use afn_core::{CompId, LinkId, NodeId};
use afn_graph::{EquationMap, Network};
use uom::si::pressure::pascal;

use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::jacobian::{Assembly, AssemblyInput, assemble};
use crate::newton::SolveReport;
use crate::skyline::SkylineMatrix;
use crate::solution::{LinkFlow, NetworkSolution};
use crate::stack::compute_stack;

/// Where the next solve starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartState {
    /// No solve since construction or the last reset.
    Cold,
    /// Pressures hold the previous solution.
    Warm,
}

/// Owns a network and the working storage of its solver.
#[derive(Debug, Clone)]
pub struct SolverContext {
    pub(crate) network: Network,
    pub(crate) components: Vec<Component>,
    pub(crate) config: SolverConfig,
    pub(crate) equations: EquationMap,
    pub(crate) assembly: Assembly,
    pub(crate) compressed: SkylineMatrix,
    pub(crate) correction: Vec<f64>,
    pub(crate) previous_correction: Vec<f64>,
    pub(crate) pressures: Vec<f64>,
    pub(crate) air: Vec<AirState>,
    pub(crate) controls: Vec<f64>,
    pub(crate) stack: Vec<f64>,
    pub(crate) ambient_density: f64,
    pub(crate) start: StartState,
    pub(crate) link_results: Vec<LinkFlow>,
    pub(crate) last_report: Option<SolveReport>,
}

impl SolverContext {
    /// Build a context for `network`.
    ///
    /// `components[i]` is the flow model of the component slot with index
    /// `i`. Fails when the configuration is invalid or a link refers to a
    /// component that has no model.
    pub fn new(
        network: Network,
        components: Vec<Component>,
        config: SolverConfig,
    ) -> SolverResult<Self> {
        config.validate()?;

        if components.len() != network.components().len() {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "{} component models for {} component slots",
                    components.len(),
                    network.components().len()
                ),
            });
        }
        for link in network.links() {
            if link.component.index() >= components.len() {
                return Err(SolverError::ProblemSetup {
                    what: format!(
                        "link '{}' references component {} outside the component table",
                        link.name, link.component
                    ),
                });
            }
        }

        let equations = EquationMap::from_network(&network);
        let assembly = Assembly::new(&network, &equations, config.matrix_form);
        let n = equations.len();
        let node_count = network.nodes().len();
        let link_count = network.links().len();
        let ambient_density = AirState::standard().density();

        tracing::debug!(
            nodes = node_count,
            links = link_count,
            unknowns = n,
            envelope = assembly.matrix.envelope_len(),
            form = config.matrix_form.as_str(),
            "solver context built"
        );

        Ok(Self {
            compressed: SkylineMatrix::empty(config.matrix_form),
            network,
            components,
            config,
            equations,
            assembly,
            correction: vec![0.0; n],
            previous_correction: vec![0.0; n],
            pressures: vec![0.0; node_count],
            air: vec![AirState::standard(); node_count],
            controls: vec![1.0; link_count],
            stack: vec![0.0; link_count],
            ambient_density,
            start: StartState::Cold,
            link_results: vec![LinkFlow::default(); link_count],
            last_report: None,
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: CompId) -> Option<&Component> {
        self.components.get(id.index())
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn equations(&self) -> &EquationMap {
        &self.equations
    }

    /// Fix the pressure of a boundary node.
    pub fn set_boundary_pressure(&mut self, node: NodeId, pressure: Pressure) -> SolverResult<()> {
        let n = self.node_checked(node)?;
        if !n.boundary {
            return Err(SolverError::InvalidState {
                what: format!("node '{}' is not a boundary node", n.name),
            });
        }
        if !pressure.get::<pascal>().is_finite() {
            return Err(SolverError::InvalidState {
                what: format!("non-finite pressure for node '{}'", n.name),
            });
        }
        self.pressures[node.index()] = pressure.get::<pascal>();
        Ok(())
    }

    pub fn set_node_air(&mut self, node: NodeId, air: AirState) -> SolverResult<()> {
        self.node_checked(node)?;
        self.air[node.index()] = air;
        Ok(())
    }

    /// Set the control signal of a link (opening factor, fan speed ratio or
    /// flow fraction).
    pub fn set_link_control(&mut self, link: LinkId, control: f64) -> SolverResult<()> {
        let Some(slot) = self.controls.get_mut(link.index()) else {
            return Err(SolverError::InvalidState {
                what: format!("unknown link {link}"),
            });
        };
        if !(control.is_finite() && control >= 0.0) {
            return Err(SolverError::InvalidState {
                what: format!("control of link {link} must be finite and >= 0, got {control}"),
            });
        }
        *slot = control;
        Ok(())
    }

    /// Density of the outdoor air column used by the stack terms.
    pub fn set_ambient_density(&mut self, density: f64) -> SolverResult<()> {
        if !(density.is_finite() && density > 0.0) {
            return Err(SolverError::InvalidState {
                what: format!("ambient density must be finite and > 0, got {density}"),
            });
        }
        self.ambient_density = density;
        Ok(())
    }

    pub fn ambient_density(&self) -> f64 {
        self.ambient_density
    }

    pub fn link_control(&self, link: LinkId) -> Option<f64> {
        self.controls.get(link.index()).copied()
    }

    pub fn node_air(&self, node: NodeId) -> Option<&AirState> {
        self.air.get(node.index())
    }

    pub fn node_pressure(&self, node: NodeId) -> Option<Pressure> {
        self.pressures.get(node.index()).map(|p| pa(*p))
    }

    /// Node pressures [Pa], indexed by `NodeId`.
    pub fn pressures(&self) -> &[f64] {
        &self.pressures
    }

    pub fn link_flow(&self, link: LinkId) -> Option<&LinkFlow> {
        self.link_results.get(link.index())
    }

    pub fn link_flows(&self) -> &[LinkFlow] {
        &self.link_results
    }

    pub fn last_report(&self) -> Option<&SolveReport> {
        self.last_report.as_ref()
    }

    /// Whether the next solve starts cold.
    pub fn is_cold(&self) -> bool {
        self.start == StartState::Cold
    }

    /// Results of the last solve, `None` before the first one.
    pub fn solution(&self) -> Option<NetworkSolution> {
        let report = self.last_report?;
        Some(NetworkSolution {
            pressures: self.pressures.iter().map(|p| pa(*p)).collect(),
            link_flows: self.link_results.clone(),
            report,
        })
    }

    /// Zero unknown pressures, warm-start history and results. Boundary
    /// pressures, air states and controls are inputs and are kept.
    pub fn reset(&mut self) {
        for node in self.network.nodes() {
            if !node.boundary {
                self.pressures[node.id.index()] = 0.0;
            }
        }
        self.assembly.zero();
        self.correction.fill(0.0);
        self.previous_correction.fill(0.0);
        self.link_results.fill(LinkFlow::default());
        self.start = StartState::Cold;
        self.last_report = None;
    }

    /// Assemble the system at the current pressures and return it.
    ///
    /// A solve leaves the matrix factored; this gives access to the
    /// unfactored Jacobian for inspection.
    pub fn assemble(&mut self, linear: bool) -> &Assembly {
        self.update_stack();
        self.assemble_in_place(linear);
        &self.assembly
    }

    pub(crate) fn update_stack(&mut self) {
        compute_stack(&self.network, &self.air, self.ambient_density, &mut self.stack);
    }

    pub(crate) fn assemble_in_place(&mut self, linear: bool) {
        let input = AssemblyInput {
            network: &self.network,
            components: &self.components,
            equations: &self.equations,
            pressures: &self.pressures,
            air: &self.air,
            controls: &self.controls,
            stack: &self.stack,
            linear,
        };
        assemble(&input, &mut self.assembly);
    }

    /// Convert the component results of the last assembly into link flows.
    pub(crate) fn record_link_flows(&mut self) {
        for (idx, link) in self.network.links().iter().enumerate() {
            let [a, b] = link.nodes;
            self.link_results[idx] = LinkFlow::from_component_flow(
                &self.assembly.link_flows[idx],
                self.assembly.pressure_drops[idx],
                &self.air[a.index()],
                &self.air[b.index()],
            );
        }
    }

    fn node_checked(&self, node: NodeId) -> SolverResult<&afn_graph::Node> {
        self.network.node(node).ok_or_else(|| SolverError::InvalidState {
            what: format!("unknown node {node}"),
        })
    }
}
