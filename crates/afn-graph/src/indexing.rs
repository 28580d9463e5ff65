//! Equation numbering for the solver.
//!
//! Unknown (non-boundary) nodes get contiguous equation indices 0..N in node
//! table order; boundary nodes get none.

use afn_core::NodeId;

use crate::network::Network;

/// Bidirectional map between nodes and equation rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquationMap {
    /// Node index -> equation row, `None` for boundary nodes.
    node_to_eq: Vec<Option<usize>>,
    /// Equation row -> node.
    eq_to_node: Vec<NodeId>,
}

impl EquationMap {
    pub fn from_network(network: &Network) -> Self {
        let mut node_to_eq = Vec::with_capacity(network.nodes().len());
        let mut eq_to_node = Vec::new();
        for node in network.nodes() {
            if node.boundary {
                node_to_eq.push(None);
            } else {
                node_to_eq.push(Some(eq_to_node.len()));
                eq_to_node.push(node.id);
            }
        }
        Self {
            node_to_eq,
            eq_to_node,
        }
    }

    /// Number of equations (unknown nodes).
    pub fn len(&self) -> usize {
        self.eq_to_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eq_to_node.is_empty()
    }

    /// Equation row of a node, `None` for boundary or unknown ids.
    pub fn equation(&self, node: NodeId) -> Option<usize> {
        self.node_to_eq.get(node.index()).copied().flatten()
    }

    /// Node owning an equation row.
    pub fn node(&self, eq: usize) -> Option<NodeId> {
        self.eq_to_node.get(eq).copied()
    }

    /// Equation rows of both link ends.
    pub fn link_equations(&self, nodes: [NodeId; 2]) -> [Option<usize>; 2] {
        [self.equation(nodes[0]), self.equation(nodes[1])]
    }

    /// Pairs of equation rows coupled by a link with two unknown ends.
    pub fn coupled_pairs<'a>(
        &'a self,
        network: &'a Network,
    ) -> impl Iterator<Item = (usize, usize)> + 'a {
        network
            .links()
            .iter()
            .filter_map(move |link| match self.link_equations(link.nodes) {
                [Some(a), Some(b)] => Some((a, b)),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NetworkBuilder;

    #[test]
    fn boundary_nodes_have_no_equation() {
        let mut b = NetworkBuilder::new();
        let a = b.add_zone_node("A", 0.0);
        let out = b.add_external_node("Out", 0.0);
        let c = b.add_zone_node("C", 0.0);
        let comp = b.add_component("Crack");
        b.add_link("L1", a, out, comp);
        b.add_link("L2", a, c, comp);
        b.add_link("L3", out, c, comp);
        let net = b.build().unwrap();

        let map = EquationMap::from_network(&net);
        assert_eq!(map.len(), 2);
        assert_eq!(map.equation(a), Some(0));
        assert_eq!(map.equation(out), None);
        assert_eq!(map.equation(c), Some(1));
        assert_eq!(map.node(1), Some(c));

        let pairs: Vec<_> = map.coupled_pairs(&net).collect();
        assert_eq!(pairs, vec![(0, 1)]);
    }
}
