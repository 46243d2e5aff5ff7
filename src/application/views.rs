//! Read-side response shapes, one per operation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{Node, NodeId, NodeStore, NodeType, Product, ProductId};

fn supplier_name(node: &Node, store: &NodeStore) -> Option<String> {
    node.supplier
        .and_then(|s| store.node(s))
        .map(|s| s.name.clone())
}

/// Row of a node listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    pub email: String,
    pub country: String,
    pub city: String,
    pub supplier: Option<NodeId>,
    pub supplier_name: Option<String>,
    pub hierarchy_level: u32,
    pub debt: Decimal,
    pub created_at: DateTime<Utc>,
}

impl NodeSummary {
    pub fn from_node(node: &Node, store: &NodeStore) -> Self {
        Self {
            id: node.id,
            name: node.name.clone(),
            node_type: node.node_type,
            email: node.email.clone(),
            country: node.country.clone(),
            city: node.city.clone(),
            supplier: node.supplier,
            supplier_name: supplier_name(node, store),
            hierarchy_level: node.hierarchy_level,
            debt: node.debt,
            created_at: node.created_at,
        }
    }
}

/// Full record of one node, including its products.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDetail {
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    pub email: String,
    pub country: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
    pub full_address: String,
    pub supplier: Option<NodeId>,
    pub supplier_name: Option<String>,
    pub hierarchy_level: u32,
    pub debt: Decimal,
    pub products: Vec<ProductView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NodeDetail {
    pub fn from_node(node: &Node, store: &NodeStore) -> Self {
        let mut products: Vec<ProductView> = store
            .products_of(node.id)
            .map(|p| ProductView::from_product(p, Some(node)))
            .collect();
        products.sort_by(|a, b| {
            b.release_date
                .cmp(&a.release_date)
                .then_with(|| a.name.cmp(&b.name))
        });
        Self {
            id: node.id,
            name: node.name.clone(),
            node_type: node.node_type,
            email: node.email.clone(),
            country: node.country.clone(),
            city: node.city.clone(),
            street: node.street.clone(),
            house_number: node.house_number.clone(),
            full_address: node.full_address(),
            supplier: node.supplier,
            supplier_name: supplier_name(node, store),
            hierarchy_level: node.hierarchy_level,
            debt: node.debt,
            products,
            created_at: node.created_at,
            updated_at: node.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub node: NodeId,
    pub node_name: Option<String>,
    pub name: String,
    pub model: String,
    pub release_date: NaiveDate,
}

impl ProductView {
    pub fn from_product(product: &Product, owner: Option<&Node>) -> Self {
        Self {
            id: product.id,
            node: product.node,
            node_name: owner.map(|o| o.name.clone()),
            name: product.name.clone(),
            model: product.model.clone(),
            release_date: product.release_date,
        }
    }
}

/// Result of the clear-debt operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearDebtOutcome {
    pub message: String,
    pub node: NodeDetail,
}

/// Confirmation of a node deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionReceipt {
    pub node: NodeId,
    pub name: String,
    pub products_removed: usize,
}
