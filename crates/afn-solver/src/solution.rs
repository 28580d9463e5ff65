//! Per-link results and the solved network state.

use afn_air::AirState;
use afn_components::ComponentFlow;
use afn_core::units::{MassRate, Pressure, VolumeRate, kgps, m3ps, pa};
use afn_core::{LinkId, NodeId};
use afn_graph::Network;

use crate::newton::SolveReport;

/// Simulated flow state of one link.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinkFlow {
    /// Net mass flow from node 1 to node 2 (kg/s)
    pub net: f64,
    /// Mass flow moving from node 1 to node 2 (kg/s, >= 0)
    pub forward: f64,
    /// Mass flow moving from node 2 to node 1 (kg/s, >= 0)
    pub reverse: f64,
    /// Forward volume flow at node 1 density (m³/s)
    pub forward_volume: f64,
    /// Reverse volume flow at node 2 density (m³/s)
    pub reverse_volume: f64,
    /// P1 - P2 + stack (Pa)
    pub pressure_drop: f64,
}

impl LinkFlow {
    pub fn from_component_flow(
        flow: &ComponentFlow,
        pressure_drop: f64,
        from: &AirState,
        to: &AirState,
    ) -> Self {
        let forward = flow.forward();
        let reverse = flow.reverse();
        Self {
            net: flow.net(),
            forward,
            reverse,
            forward_volume: forward / from.density(),
            reverse_volume: reverse / to.density(),
            pressure_drop,
        }
    }

    pub fn net_mass_rate(&self) -> MassRate {
        kgps(self.net)
    }

    pub fn forward_volume_rate(&self) -> VolumeRate {
        m3ps(self.forward_volume)
    }

    pub fn reverse_volume_rate(&self) -> VolumeRate {
        m3ps(self.reverse_volume)
    }

    pub fn pressure_difference(&self) -> Pressure {
        pa(self.pressure_drop)
    }
}

/// Snapshot of a solve: node pressures, link flows and the report.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSolution {
    /// Node pressures, indexed by `NodeId`
    pub pressures: Vec<Pressure>,
    /// Link flows, indexed by `LinkId`
    pub link_flows: Vec<LinkFlow>,
    pub report: SolveReport,
}

impl NetworkSolution {
    pub fn node_pressure(&self, node: NodeId) -> Option<Pressure> {
        self.pressures.get(node.index()).copied()
    }

    pub fn link_flow(&self, link: LinkId) -> Option<&LinkFlow> {
        self.link_flows.get(link.index())
    }

    /// Net mass flow leaving `node` through its links (kg/s).
    pub fn node_imbalance(&self, network: &Network, node: NodeId) -> f64 {
        network
            .node_links(node)
            .iter()
            .filter_map(|&id| {
                let link = network.link(id)?;
                let flow = self.link_flows.get(id.index())?;
                Some(if link.from_node() == node {
                    flow.net
                } else {
                    -flow.net
                })
            })
            .sum()
    }
}
