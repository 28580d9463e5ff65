//! Incremental network builder.

use afn_core::{CompId, LinkId, NodeId};

use crate::error::GraphResult;
use crate::network::{ComponentSlot, Link, Network, Node, NodeKind};
use crate::validate;

/// Builder for constructing a network incrementally.
///
/// Add nodes, component slots and links, then call `build()` to validate and
/// freeze everything into an immutable `Network`. Ids are handed out in table
/// order, which is also the assembly order used by the solver.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    nodes: Vec<Node>,
    links: Vec<Link>,
    components: Vec<ComponentSlot>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node of any kind.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        kind: NodeKind,
        elevation: f64,
        boundary: bool,
    ) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node {
            id,
            name: name.into(),
            kind,
            elevation,
            boundary,
            tag: None,
        });
        id
    }

    /// Add a zone node with unknown pressure.
    pub fn add_zone_node(&mut self, name: impl Into<String>, elevation: f64) -> NodeId {
        self.add_node(name, NodeKind::Zone, elevation, false)
    }

    /// Add an outdoor boundary node.
    pub fn add_external_node(&mut self, name: impl Into<String>, elevation: f64) -> NodeId {
        self.add_node(name, NodeKind::External, elevation, true)
    }

    /// Add a duct junction with unknown pressure.
    pub fn add_duct_node(&mut self, name: impl Into<String>, elevation: f64) -> NodeId {
        self.add_node(name, NodeKind::DuctJunction, elevation, false)
    }

    /// Mark a node as fixed-pressure (or free it again).
    pub fn set_boundary(&mut self, node: NodeId, boundary: bool) {
        if let Some(n) = self.nodes.get_mut(node.index()) {
            n.boundary = boundary;
        }
    }

    /// Attach the caller's zone or outdoor-node identifier.
    pub fn set_tag(&mut self, node: NodeId, tag: u32) {
        if let Some(n) = self.nodes.get_mut(node.index()) {
            n.tag = Some(tag);
        }
    }

    /// Reserve a row in the component table.
    pub fn add_component(&mut self, name: impl Into<String>) -> CompId {
        let id = CompId::from_index(self.components.len());
        self.components.push(ComponentSlot {
            id,
            name: name.into(),
        });
        id
    }

    /// Add a link from `from` to `to` through `component`.
    ///
    /// Multiplier defaults to 1 and connection heights to 0.
    pub fn add_link(
        &mut self,
        name: impl Into<String>,
        from: NodeId,
        to: NodeId,
        component: CompId,
    ) -> LinkId {
        let id = LinkId::from_index(self.links.len());
        self.links.push(Link {
            id,
            name: name.into(),
            nodes: [from, to],
            component,
            multiplier: 1.0,
            heights: [0.0, 0.0],
        });
        id
    }

    pub fn set_link_multiplier(&mut self, link: LinkId, multiplier: f64) {
        if let Some(l) = self.links.get_mut(link.index()) {
            l.multiplier = multiplier;
        }
    }

    /// Set connection heights relative to the from and to node elevations.
    pub fn set_link_heights(&mut self, link: LinkId, heights: [f64; 2]) {
        if let Some(l) = self.links.get_mut(link.index()) {
            l.heights = heights;
        }
    }

    /// Validate and build the immutable `Network`.
    pub fn build(self) -> GraphResult<Network> {
        validate::validate_structure(&self.nodes, &self.links, &self.components)?;

        let (node_link_offsets, node_links) = Self::build_adjacency(&self.nodes, &self.links);

        validate::validate_adjacency(&self.links, &node_link_offsets, &node_links)?;

        Ok(Network {
            nodes: self.nodes,
            links: self.links,
            components: self.components,
            node_link_offsets,
            node_links,
        })
    }

    /// Counting sort of link ends by node; each node's list stays in link order.
    fn build_adjacency(nodes: &[Node], links: &[Link]) -> (Vec<usize>, Vec<LinkId>) {
        let mut offsets = vec![0usize; nodes.len() + 1];
        for link in links {
            for node in link.nodes {
                offsets[node.index() + 1] += 1;
            }
        }
        for i in 0..nodes.len() {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets.clone();
        let mut flat = vec![LinkId::from_index(0); offsets[nodes.len()]];
        for link in links {
            for node in link.nodes {
                let slot = &mut cursor[node.index()];
                flat[*slot] = link.id;
                *slot += 1;
            }
        }

        (offsets, flat)
    }
}
