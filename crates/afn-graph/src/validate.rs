//! Structural validation run by `NetworkBuilder::build`.

use std::collections::HashSet;

use crate::error::{GraphError, GraphResult};
use crate::network::{ComponentSlot, Link, Node};
use afn_core::LinkId;

pub(crate) fn validate_structure(
    nodes: &[Node],
    links: &[Link],
    components: &[ComponentSlot],
) -> GraphResult<()> {
    let mut names = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !node.elevation.is_finite() {
            return Err(GraphError::NonFiniteGeometry {
                what: "node elevation",
            });
        }
        if !names.insert(node.name.as_str()) {
            return Err(GraphError::DuplicateNodeName {
                name: node.name.clone(),
            });
        }
    }

    if !nodes.is_empty() && !nodes.iter().any(|n| n.boundary) {
        return Err(GraphError::NoBoundaryNode);
    }

    for link in links {
        for node in link.nodes {
            if node.index() >= nodes.len() {
                return Err(GraphError::InvalidNodeRef {
                    link: link.id,
                    node,
                });
            }
        }
        if link.nodes[0] == link.nodes[1] {
            return Err(GraphError::SelfLoop {
                link: link.id,
                node: link.nodes[0],
            });
        }
        if link.component.index() >= components.len() {
            return Err(GraphError::InvalidCompRef {
                link: link.id,
                comp: link.component,
            });
        }
        if !link.multiplier.is_finite() || link.multiplier <= 0.0 {
            return Err(GraphError::InvalidMultiplier {
                link: link.id,
                value: link.multiplier,
            });
        }
        if !link.heights.iter().all(|h| h.is_finite()) {
            return Err(GraphError::NonFiniteGeometry {
                what: "link height",
            });
        }
    }

    Ok(())
}

pub(crate) fn validate_adjacency(
    links: &[Link],
    offsets: &[usize],
    node_links: &[LinkId],
) -> GraphResult<()> {
    for node_idx in 0..offsets.len().saturating_sub(1) {
        for &link_id in &node_links[offsets[node_idx]..offsets[node_idx + 1]] {
            let link = &links[link_id.index()];
            if !link.nodes.iter().any(|n| n.index() == node_idx) {
                return Err(GraphError::InconsistentAdjacency {
                    link: link_id,
                    node: afn_core::NodeId::from_index(node_idx),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use afn_core::{CompId, NodeId};

    fn node(i: usize, name: &str, boundary: bool) -> Node {
        Node {
            id: NodeId::from_index(i),
            name: name.into(),
            kind: crate::NodeKind::Zone,
            elevation: 0.0,
            boundary,
            tag: None,
        }
    }

    #[test]
    fn dangling_node_reference() {
        let nodes = vec![node(0, "A", true)];
        let comps = vec![ComponentSlot {
            id: CompId::from_index(0),
            name: "C".into(),
        }];
        let links = vec![Link {
            id: LinkId::from_index(0),
            name: "L".into(),
            nodes: [NodeId::from_index(0), NodeId::from_index(5)],
            component: CompId::from_index(0),
            multiplier: 1.0,
            heights: [0.0, 0.0],
        }];
        let err = validate_structure(&nodes, &links, &comps).unwrap_err();
        assert!(matches!(err, GraphError::InvalidNodeRef { .. }));
    }

    #[test]
    fn dangling_component_reference() {
        let nodes = vec![node(0, "A", true), node(1, "B", false)];
        let links = vec![Link {
            id: LinkId::from_index(0),
            name: "L".into(),
            nodes: [NodeId::from_index(0), NodeId::from_index(1)],
            component: CompId::from_index(3),
            multiplier: 1.0,
            heights: [0.0, 0.0],
        }];
        let err = validate_structure(&nodes, &links, &[]).unwrap_err();
        assert!(matches!(err, GraphError::InvalidCompRef { .. }));
    }

    #[test]
    fn duplicate_names_and_missing_boundary() {
        let nodes = vec![node(0, "A", true), node(1, "A", false)];
        assert!(matches!(
            validate_structure(&nodes, &[], &[]),
            Err(GraphError::DuplicateNodeName { .. })
        ));

        let nodes = vec![node(0, "A", false)];
        assert_eq!(
            validate_structure(&nodes, &[], &[]),
            Err(GraphError::NoBoundaryNode)
        );
    }
}
