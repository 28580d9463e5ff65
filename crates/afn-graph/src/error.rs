//! Topology error types.

use afn_core::{AfnError, CompId, LinkId, NodeId};

pub type GraphResult<T> = Result<T, GraphError>;

/// Network construction and validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A link refers to a node that doesn't exist.
    InvalidNodeRef { link: LinkId, node: NodeId },

    /// A link refers to a component that doesn't exist.
    InvalidCompRef { link: LinkId, comp: CompId },

    /// A link connects a node to itself.
    SelfLoop { link: LinkId, node: NodeId },

    /// A link multiplier is zero, negative or not finite.
    InvalidMultiplier { link: LinkId, value: f64 },

    /// A node elevation or link height is not finite.
    NonFiniteGeometry { what: &'static str },

    /// Two nodes share a name.
    DuplicateNodeName { name: String },

    /// Node table contains no boundary node, so every pressure floats.
    NoBoundaryNode,

    /// Adjacency list is inconsistent (link in a node's list but not touching it).
    InconsistentAdjacency { link: LinkId, node: NodeId },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::InvalidNodeRef { link, node } => {
                write!(f, "Link {} refers to non-existent node {}", link, node)
            }
            GraphError::InvalidCompRef { link, comp } => {
                write!(f, "Link {} refers to non-existent component {}", link, comp)
            }
            GraphError::SelfLoop { link, node } => {
                write!(f, "Link {} connects node {} to itself", link, node)
            }
            GraphError::InvalidMultiplier { link, value } => {
                write!(f, "Link {} has invalid multiplier {}", link, value)
            }
            GraphError::NonFiniteGeometry { what } => {
                write!(f, "Non-finite geometry value: {}", what)
            }
            GraphError::DuplicateNodeName { name } => {
                write!(f, "Duplicate node name '{}'", name)
            }
            GraphError::NoBoundaryNode => {
                write!(f, "Network has no boundary node")
            }
            GraphError::InconsistentAdjacency { link, node } => {
                write!(
                    f,
                    "Link {} in node {}'s adjacency list but doesn't reference that node",
                    link, node
                )
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl From<GraphError> for AfnError {
    fn from(err: GraphError) -> Self {
        AfnError::Invariant {
            what: err.to_string(),
        }
    }
}
