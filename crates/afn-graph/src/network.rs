//! Node, link and component tables.

use afn_core::{CompId, LinkId, NodeId};

/// Role of a node in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NodeKind {
    /// A thermal zone.
    Zone,
    /// An outdoor boundary point on a facade.
    External,
    /// A junction in the air distribution system.
    DuctJunction,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Zone => "zone",
            NodeKind::External => "external",
            NodeKind::DuctJunction => "duct_junction",
        }
    }
}

/// A point in the network with a solved-for or fixed pressure.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    /// Reference elevation above ground [m].
    pub elevation: f64,
    /// Fixed-pressure node, excluded from the unknown vector.
    pub boundary: bool,
    /// Zone or outdoor-node identifier owned by the caller.
    pub tag: Option<u32>,
}

/// A connection between two nodes through one component.
///
/// Flow from `nodes[0]` to `nodes[1]` is positive.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub name: String,
    pub nodes: [NodeId; 2],
    pub component: CompId,
    /// Number of identical elements in parallel.
    pub multiplier: f64,
    /// Connection height relative to each node's elevation [m].
    pub heights: [f64; 2],
}

impl Link {
    pub fn from_node(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn to_node(&self) -> NodeId {
        self.nodes[1]
    }
}

/// A named entry of the component table; the flow model itself lives with
/// the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSlot {
    pub id: CompId,
    pub name: String,
}

/// Validated, immutable network topology.
///
/// Tables are indexed by their ids. Adjacency is stored compactly: node i's
/// incident links are `node_links[node_link_offsets[i]..node_link_offsets[i + 1]]`.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,
    pub(crate) components: Vec<ComponentSlot>,
    pub(crate) node_link_offsets: Vec<usize>,
    pub(crate) node_links: Vec<LinkId>,
}

impl Network {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn components(&self) -> &[ComponentSlot] {
        &self.components
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.index())
    }

    pub fn component(&self, id: CompId) -> Option<&ComponentSlot> {
        self.components.get(id.index())
    }

    /// Look up a node by name.
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Look up a link by name.
    pub fn link_by_name(&self, name: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Links incident to a node, in link table order.
    pub fn node_links(&self, node: NodeId) -> &[LinkId] {
        let idx = node.index();
        if idx >= self.nodes.len() {
            return &[];
        }
        &self.node_links[self.node_link_offsets[idx]..self.node_link_offsets[idx + 1]]
    }

    /// Number of links incident to a node.
    pub fn degree(&self, node: NodeId) -> usize {
        self.node_links(node).len()
    }

    /// Number of nodes whose pressure is solved for.
    pub fn unknown_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.boundary).count()
    }

    /// Nodes with no incident link.
    pub fn isolated_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .map(|n| n.id)
            .filter(|&id| self.degree(id) == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_endpoints() {
        let link = Link {
            id: LinkId::from_index(0),
            name: "L".into(),
            nodes: [NodeId::from_index(4), NodeId::from_index(7)],
            component: CompId::from_index(0),
            multiplier: 1.0,
            heights: [0.0, 0.0],
        };
        assert_eq!(link.from_node().index(), 4);
        assert_eq!(link.to_node().index(), 7);
    }

    #[test]
    fn node_kind_names() {
        assert_eq!(NodeKind::Zone.as_str(), "zone");
        assert_eq!(NodeKind::DuctJunction.as_str(), "duct_junction");
    }
}
