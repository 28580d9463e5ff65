//! Jacobian and residual assembly.
//!
//! For every link, in table order, the component is evaluated at
//! `dp = P1 - P2 + stack`. Its derivative goes on the diagonal of each
//! unknown end and, negated, on the off-diagonal entry coupling two unknown
//! ends. The residual of an unknown node is the net mass flow leaving it.

use afn_air::AirState;
use afn_components::{Component, ComponentFlow, FlowInput};
use afn_graph::{EquationMap, Network};

use crate::skyline::{MatrixForm, SkylineMatrix};

/// Everything the assembler reads.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyInput<'a> {
    pub network: &'a Network,
    /// Indexed by `CompId`.
    pub components: &'a [Component],
    pub equations: &'a EquationMap,
    /// Node pressures [Pa], indexed by `NodeId`.
    pub pressures: &'a [f64],
    /// Node air states, indexed by `NodeId`.
    pub air: &'a [AirState],
    /// Link controls, indexed by `LinkId`.
    pub controls: &'a [f64],
    /// Link stack pressures [Pa], indexed by `LinkId`.
    pub stack: &'a [f64],
    /// Evaluate every component on its laminar branch.
    pub linear: bool,
}

/// Assembled system plus the per-link evaluation it came from.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub matrix: SkylineMatrix,
    /// Net mass flow leaving each unknown node [kg/s].
    pub residual: Vec<f64>,
    /// Sum of flow magnitudes at each unknown node [kg/s].
    pub characteristic: Vec<f64>,
    /// Component result of each link.
    pub link_flows: Vec<ComponentFlow>,
    /// Pressure difference across each link, stack included [Pa].
    pub pressure_drops: Vec<f64>,
}

impl Assembly {
    /// Allocate storage sized for `network`.
    pub fn new(network: &Network, equations: &EquationMap, form: MatrixForm) -> Self {
        let n = equations.len();
        Self {
            matrix: SkylineMatrix::from_pairs(n, equations.coupled_pairs(network), form),
            residual: vec![0.0; n],
            characteristic: vec![0.0; n],
            link_flows: vec![ComponentFlow::zero(); network.links().len()],
            pressure_drops: vec![0.0; network.links().len()],
        }
    }

    pub fn zero(&mut self) {
        self.matrix.zero();
        self.residual.fill(0.0);
        self.characteristic.fill(0.0);
        self.link_flows.fill(ComponentFlow::zero());
        self.pressure_drops.fill(0.0);
    }
}

/// Zero `out` and assemble the system for the current state.
pub fn assemble(input: &AssemblyInput<'_>, out: &mut Assembly) {
    out.zero();
    let form = out.matrix.form();

    for (idx, link) in input.network.links().iter().enumerate() {
        let [a, b] = link.nodes;
        let dp = input.pressures[a.index()] - input.pressures[b.index()] + input.stack[idx];
        let flow_input = FlowInput::new(dp, &input.air[a.index()], &input.air[b.index()])
            .with_multiplier(link.multiplier)
            .with_control(input.controls[idx])
            .with_linear(input.linear);
        let flow = input.components[link.component.index()].calculate(&flow_input);

        let net = flow.net();
        let df = flow.total_derivative();
        let magnitude = flow.magnitude();
        let [ea, eb] = input.equations.link_equations(link.nodes);

        if let Some(i) = ea {
            out.residual[i] += net;
            out.characteristic[i] += magnitude;
            out.matrix.add_diag(i, df);
        }
        if let Some(j) = eb {
            out.residual[j] -= net;
            out.characteristic[j] += magnitude;
            out.matrix.add_diag(j, df);
        }
        if let (Some(i), Some(j)) = (ea, eb) {
            let stored = out.matrix.add(i, j, -df);
            debug_assert!(stored, "link {} outside the matrix envelope", link.id);
            if form == MatrixForm::Unsymmetric {
                let stored = out.matrix.add(j, i, -df);
                debug_assert!(stored, "link {} outside the matrix envelope", link.id);
            }
        }

        out.link_flows[idx] = flow;
        out.pressure_drops[idx] = dp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afn_components::SurfaceCrack;
    use afn_graph::NetworkBuilder;

    #[test]
    fn triangle_assembly() {
        let mut b = NetworkBuilder::new();
        let a = b.add_external_node("A", 0.0);
        let n1 = b.add_zone_node("B", 0.0);
        let n2 = b.add_zone_node("C", 0.0);
        let c = b.add_component("Crack");
        b.add_link("AB", a, n1, c);
        b.add_link("BC", n1, n2, c);
        b.add_link("CA", n2, a, c);
        let net = b.build().unwrap();
        let eq = EquationMap::from_network(&net);

        let components = vec![Component::from(SurfaceCrack::new(0.01, 0.65).unwrap())];
        let air = vec![AirState::standard(); 3];
        let pressures = [10.0, 4.0, 1.0];
        let controls = [1.0; 3];
        let stack = [0.0; 3];
        let input = AssemblyInput {
            network: &net,
            components: &components,
            equations: &eq,
            pressures: &pressures,
            air: &air,
            controls: &controls,
            stack: &stack,
            linear: false,
        };
        let mut out = Assembly::new(&net, &eq, MatrixForm::Symmetric);
        assemble(&input, &mut out);

        let f = |dp: f64| 0.01 * dp.powf(0.65);
        let f_ab = f(6.0);
        let f_bc = f(3.0);
        let f_ca = -f(9.0);
        assert!((out.link_flows[0].net() - f_ab).abs() < 1e-12);
        // B: receives AB, sends BC.
        assert!((out.residual[0] - (-f_ab + f_bc)).abs() < 1e-12);
        // C: receives BC, sends CA.
        assert!((out.residual[1] - (-f_bc + f_ca)).abs() < 1e-12);
        assert!((out.characteristic[0] - (f_ab + f_bc)).abs() < 1e-12);

        let d_bc = out.link_flows[1].total_derivative();
        assert_eq!(out.matrix.get(0, 1), -d_bc);
        assert_eq!(out.matrix.get(1, 0), -d_bc);
        let d_ab = out.link_flows[0].total_derivative();
        assert!((out.matrix.get(0, 0) - (d_ab + d_bc)).abs() < 1e-15);
        assert_eq!(out.pressure_drops[2], -9.0);
    }

    #[test]
    fn reassembly_starts_from_zero() {
        let mut b = NetworkBuilder::new();
        let a = b.add_external_node("A", 0.0);
        let z = b.add_zone_node("Z", 0.0);
        let c = b.add_component("Crack");
        b.add_link("L", a, z, c);
        let net = b.build().unwrap();
        let eq = EquationMap::from_network(&net);
        let components = vec![Component::from(SurfaceCrack::new(0.02, 0.5).unwrap())];
        let air = vec![AirState::standard(); 2];
        let input = AssemblyInput {
            network: &net,
            components: &components,
            equations: &eq,
            pressures: &[4.0, 0.0],
            air: &air,
            controls: &[1.0],
            stack: &[0.0],
            linear: false,
        };
        let mut out = Assembly::new(&net, &eq, MatrixForm::Unsymmetric);
        assemble(&input, &mut out);
        let first = out.residual.clone();
        assemble(&input, &mut out);
        assert_eq!(out.residual, first);
        assert!((out.residual[0] + 0.04).abs() < 1e-12);
    }
}
