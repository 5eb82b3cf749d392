//! Host command tree boundary
//!
//! The role engine reads a host tree at well-defined lifecycle points and
//! swaps node requirements. It never changes tree topology.

use slotmap::new_key_type;

use crate::path::CommandPath;
use crate::requirement::Requirement;

new_key_type! {
    /// Handle for a node in a host command tree
    pub struct NodeId;
}

/// One node as listed by the host
pub struct NodeEntry<S> {
    /// Host handle used for [`CommandTree::replace_requirement`]
    pub id: NodeId,
    /// Path from the root to this node
    pub path: CommandPath,
    /// The node's current guard
    pub requirement: Requirement<S>,
}

/// Errors a host may report when asked to swap a requirement
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The node handle does not belong to this tree (e.g. stale after a rebuild)
    #[error("Unknown command node: {0:?}")]
    UnknownNode(NodeId),

    /// The node's shape does not allow its requirement to be replaced
    #[error("Requirement of '{0}' cannot be replaced")]
    Sealed(String),
}

/// A host command tree whose guards can be recomposed
pub trait CommandTree<S> {
    /// Every node reachable from the root (root excluded), parents before children
    fn list_all_nodes(&self) -> Vec<NodeEntry<S>>;

    /// Replace a node's requirement, returning the previous one
    fn replace_requirement(
        &mut self,
        node: NodeId,
        requirement: Requirement<S>,
    ) -> Result<Requirement<S>, TreeError>;
}
