//! NodeStore: the keyed collection of nodes and products.
//!
//! Nodes reference their supplier by id, never by pointer. The store owns the
//! constraints a relational backend would enforce: unique ids, existing
//! supplier for every supplier reference, protected deletion of referenced
//! nodes, existing owner for every product and unique (node, name, model).
//! It does not know about node types or hierarchy levels; those rules live in
//! the hierarchy engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::entities::{Node, NodeId, Product, ProductId};
use crate::domain::error::{DomainError, DomainResult};

/// Current on-disk snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStore {
    last_node_id: u64,
    last_product_id: u64,
    nodes: BTreeMap<NodeId, Node>,
    products: BTreeMap<ProductId, Product>,
}

/// Serializable form of a [`NodeStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub last_node_id: u64,
    pub last_product_id: u64,
    pub nodes: Vec<Node>,
    pub products: Vec<Product>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------
    // nodes
    // ------------------------------------------------------------

    /// Reserve the next node id.
    pub fn allocate_node_id(&mut self) -> NodeId {
        self.last_node_id += 1;
        NodeId(self.last_node_id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Look up a node or fail with NotFound.
    pub fn require_node(&self, id: NodeId) -> DomainResult<&Node> {
        self.nodes.get(&id).ok_or(DomainError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn find_node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.values().find(|n| n.name == name)
    }

    /// Ids of the nodes that name `id` as their supplier.
    #[instrument(level = "trace", skip(self))]
    pub fn clients_of(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.supplier == Some(id))
            .map(|n| n.id)
            .collect()
    }

    /// Insert a new node.
    #[instrument(level = "trace", skip(self, node), fields(id = %node.id))]
    pub fn insert_node(&mut self, node: Node) -> DomainResult<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(DomainError::Corrupt(format!("node id {} already used", node.id)));
        }
        self.check_supplier_exists(&node)?;
        self.last_node_id = self.last_node_id.max(node.id.0);
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Replace an existing node with a new version of itself.
    #[instrument(level = "trace", skip(self, node), fields(id = %node.id))]
    pub fn replace_node(&mut self, node: Node) -> DomainResult<()> {
        if !self.nodes.contains_key(&node.id) {
            return Err(DomainError::NodeNotFound(node.id));
        }
        self.check_supplier_exists(&node)?;
        self.nodes.insert(node.id, node);
        Ok(())
    }

    fn check_supplier_exists(&self, node: &Node) -> DomainResult<()> {
        match node.supplier {
            Some(s) if !self.nodes.contains_key(&s) => Err(DomainError::UnknownSupplier(s)),
            _ => Ok(()),
        }
    }

    /// Fail when `id` is missing or still supplies other nodes.
    pub fn ensure_removable(&self, id: NodeId) -> DomainResult<()> {
        self.require_node(id)?;
        let dependents = self.clients_of(id);
        if !dependents.is_empty() {
            return Err(DomainError::DependentsExist {
                node: id,
                dependents,
            });
        }
        Ok(())
    }

    /// Remove a node and every product it owns.
    ///
    /// Refused while any node still names it as supplier.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_node(&mut self, id: NodeId) -> DomainResult<(Node, Vec<Product>)> {
        self.ensure_removable(id)?;
        let owned: Vec<ProductId> = self
            .products
            .values()
            .filter(|p| p.node == id)
            .map(|p| p.id)
            .collect();
        let products = owned
            .iter()
            .filter_map(|pid| self.products.remove(pid))
            .collect();
        let node = self.nodes.remove(&id).ok_or(DomainError::NodeNotFound(id))?;
        Ok((node, products))
    }

    // ------------------------------------------------------------
    // products
    // ------------------------------------------------------------

    pub fn allocate_product_id(&mut self) -> ProductId {
        self.last_product_id += 1;
        ProductId(self.last_product_id)
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn require_product(&self, id: ProductId) -> DomainResult<&Product> {
        self.products.get(&id).ok_or(DomainError::ProductNotFound(id))
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Products owned by `node`, in id order.
    pub fn products_of(&self, node: NodeId) -> impl Iterator<Item = &Product> {
        self.products.values().filter(move |p| p.node == node)
    }

    pub fn insert_product(&mut self, product: Product) -> DomainResult<()> {
        if self.products.contains_key(&product.id) {
            return Err(DomainError::Corrupt(format!(
                "product id {} already used",
                product.id
            )));
        }
        self.check_product(&product)?;
        self.last_product_id = self.last_product_id.max(product.id.0);
        self.products.insert(product.id, product);
        Ok(())
    }

    pub fn replace_product(&mut self, product: Product) -> DomainResult<()> {
        if !self.products.contains_key(&product.id) {
            return Err(DomainError::ProductNotFound(product.id));
        }
        self.check_product(&product)?;
        self.products.insert(product.id, product);
        Ok(())
    }

    pub fn remove_product(&mut self, id: ProductId) -> DomainResult<Product> {
        self.products
            .remove(&id)
            .ok_or(DomainError::ProductNotFound(id))
    }

    /// Owner must exist and (node, name, model) must stay unique.
    fn check_product(&self, product: &Product) -> DomainResult<()> {
        if !self.nodes.contains_key(&product.node) {
            return Err(DomainError::NodeNotFound(product.node));
        }
        let duplicate = self.products.values().any(|p| {
            p.id != product.id
                && p.node == product.node
                && p.name == product.name
                && p.model == product.model
        });
        if duplicate {
            return Err(DomainError::DuplicateProduct {
                node: product.node,
                name: product.name.clone(),
                model: product.model.clone(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------
    // snapshots
    // ------------------------------------------------------------

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            last_node_id: self.last_node_id,
            last_product_id: self.last_product_id,
            nodes: self.nodes.values().cloned().collect(),
            products: self.products.values().cloned().collect(),
        }
    }

    /// Rebuild a store from a snapshot, re-checking every store constraint.
    ///
    /// Nodes may appear in any order; supplier references are checked once all
    /// nodes are known.
    pub fn from_snapshot(snapshot: Snapshot) -> DomainResult<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DomainError::Corrupt(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        let mut store = NodeStore {
            last_node_id: snapshot.last_node_id,
            last_product_id: snapshot.last_product_id,
            ..Default::default()
        };
        for node in snapshot.nodes {
            if store.nodes.insert(node.id, node).is_some() {
                return Err(DomainError::Corrupt("duplicate node id".into()));
            }
        }
        for node in store.nodes.values() {
            store.check_supplier_exists(node)?;
        }
        let highest = store.nodes.keys().map(|id| id.0).max().unwrap_or(0);
        store.last_node_id = store.last_node_id.max(highest);
        for product in snapshot.products {
            store.insert_product(product)?;
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{zero_debt, NodeType};
    use chrono::{NaiveDate, Utc};

    fn node(id: u64, supplier: Option<u64>) -> Node {
        let now = Utc::now();
        Node {
            id: NodeId(id),
            name: format!("node-{id}"),
            node_type: if supplier.is_some() {
                NodeType::RetailNetwork
            } else {
                NodeType::Factory
            },
            email: "a@b.c".into(),
            country: "C".into(),
            city: "C".into(),
            street: "S".into(),
            house_number: "1".into(),
            supplier: supplier.map(NodeId),
            hierarchy_level: 0,
            debt: zero_debt(),
            created_at: now,
            updated_at: now,
        }
    }

    fn product(id: u64, node: u64, name: &str, model: &str) -> Product {
        Product {
            id: ProductId(id),
            node: NodeId(node),
            name: name.into(),
            model: model.into(),
            release_date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        }
    }

    #[test]
    fn given_unknown_supplier_when_inserting_then_rejects() {
        let mut store = NodeStore::new();
        let err = store.insert_node(node(1, Some(9))).unwrap_err();
        assert_eq!(err, DomainError::UnknownSupplier(NodeId(9)));
    }

    #[test]
    fn given_duplicate_product_when_inserting_then_conflict() {
        let mut store = NodeStore::new();
        store.insert_node(node(1, None)).unwrap();
        store.insert_product(product(1, 1, "Phone", "X")).unwrap();

        let err = store.insert_product(product(2, 1, "Phone", "X")).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateProduct { .. }));
        // same name and model under another node is fine
        store.insert_node(node(2, None)).unwrap();
        store.insert_product(product(3, 2, "Phone", "X")).unwrap();
    }

    #[test]
    fn given_referenced_node_when_removing_then_refuses() {
        let mut store = NodeStore::new();
        store.insert_node(node(1, None)).unwrap();
        store.insert_node(node(2, Some(1))).unwrap();
        assert!(matches!(
            store.remove_node(NodeId(1)),
            Err(DomainError::DependentsExist { .. })
        ));
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn given_chain_when_checking_removability_then_only_leaf_passes() {
        let mut store = NodeStore::new();
        store.insert_node(node(1, None)).unwrap();
        store.insert_node(node(2, Some(1))).unwrap();

        assert!(store.ensure_removable(NodeId(2)).is_ok());
        assert_eq!(
            store.ensure_removable(NodeId(1)),
            Err(DomainError::DependentsExist {
                node: NodeId(1),
                dependents: vec![NodeId(2)],
            })
        );
        assert_eq!(
            store.ensure_removable(NodeId(9)),
            Err(DomainError::NodeNotFound(NodeId(9)))
        );
    }

    #[test]
    fn given_allocated_ids_when_node_removed_then_ids_not_reused() {
        let mut store = NodeStore::new();
        let first = store.allocate_node_id();
        store.insert_node(node(first.0, None)).unwrap();
        store.remove_node(first).unwrap();
        assert_eq!(store.allocate_node_id(), NodeId(2));
    }

    #[test]
    fn given_store_when_snapshot_roundtrips_then_equal() {
        let mut store = NodeStore::new();
        store.insert_node(node(1, None)).unwrap();
        store.insert_node(node(2, Some(1))).unwrap();
        store.insert_product(product(1, 2, "TV", "Q")).unwrap();

        let restored = NodeStore::from_snapshot(store.to_snapshot()).unwrap();
        assert_eq!(restored, store);
    }

    #[test]
    fn given_snapshot_with_dangling_product_when_loading_then_fails() {
        let mut snapshot = NodeStore::new().to_snapshot();
        snapshot.products.push(product(1, 7, "TV", "Q"));
        assert!(NodeStore::from_snapshot(snapshot).is_err());
    }
}
