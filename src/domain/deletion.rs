//! Deletion guard: protected removal of nodes.

use tracing::debug;

use crate::domain::entities::{Node, NodeId, Product};
use crate::domain::error::DomainResult;
use crate::domain::store::NodeStore;

/// What a successful node deletion removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Deleted {
    pub node: Node,
    /// Products that went with the node.
    pub products: Vec<Product>,
}

pub struct DeletionGuard;

impl DeletionGuard {
    /// Delete a node together with its products.
    ///
    /// Nodes that buy from `id` are never touched: their presence blocks the
    /// deletion instead (see [`NodeStore::ensure_removable`]).
    pub fn delete(store: &mut NodeStore, id: NodeId) -> DomainResult<Deleted> {
        let (node, products) = store.remove_node(id)?;
        debug!(
            "delete: id={} cascaded {} product(s)",
            node.id,
            products.len()
        );
        Ok(Deleted { node, products })
    }
}
