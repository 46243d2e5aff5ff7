//! Hierarchy engine: supplier validation and level computation.
//!
//! A node's level is fixed at write time from its supplier's current level.
//! Descendants are not touched when an ancestor moves; their recorded level
//! may go stale until they are saved again.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::domain::draft::{NodeDraft, NodePatch};
use crate::domain::entities::{zero_debt, Node, NodeId, NodeType};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::store::NodeStore;
use crate::domain::validation::{
    normalize_debt, FieldErrors, CITY_MAX, COUNTRY_MAX, HOUSE_NUMBER_MAX, NAME_MAX, STREET_MAX,
};

/// The part of a node the hierarchy rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// `None` while the node is being created.
    pub id: Option<NodeId>,
    pub node_type: NodeType,
    pub supplier: Option<NodeId>,
}

/// Validates supplier relationships against a store snapshot.
pub struct HierarchyEngine<'a> {
    store: &'a NodeStore,
}

impl<'a> HierarchyEngine<'a> {
    pub fn new(store: &'a NodeStore) -> Self {
        Self { store }
    }

    /// Compute the hierarchy level for a placement, or explain why it is invalid.
    #[instrument(level = "debug", skip(self))]
    pub fn level_for(&self, placement: &Placement) -> DomainResult<u32> {
        let Some(supplier_id) = placement.supplier else {
            if placement.node_type.requires_supplier() {
                return Err(DomainError::invalid(
                    "supplier",
                    format!("a {} must have a supplier", placement.node_type.label()),
                ));
            }
            return Ok(0);
        };

        let supplier = self
            .store
            .node(supplier_id)
            .ok_or(DomainError::UnknownSupplier(supplier_id))?;

        if placement.id == Some(supplier_id) {
            return Err(DomainError::invalid(
                "supplier",
                "a node cannot be its own supplier",
            ));
        }
        if !placement.node_type.requires_supplier() {
            return Err(DomainError::invalid(
                "supplier",
                "a factory cannot have a supplier; it is the top of the chain",
            ));
        }
        if let Some(id) = placement.id {
            self.reject_cycle(id, supplier_id)?;
        }

        Ok(supplier.hierarchy_level + 1)
    }

    /// Refuse to attach a node below one of its own descendants.
    fn reject_cycle(&self, id: NodeId, supplier_id: NodeId) -> DomainResult<()> {
        let mut current = Some(supplier_id);
        // bounded: a pre-existing cycle in low-level data must not hang us
        for _ in 0..=self.store.node_count() {
            match current {
                Some(c) if c == id => {
                    return Err(DomainError::invalid(
                        "supplier",
                        format!("node {supplier_id} is supplied (directly or indirectly) by node {id}"),
                    ))
                }
                Some(c) => current = self.store.node(c).and_then(|n| n.supplier),
                None => return Ok(()),
            }
        }
        Ok(())
    }

    /// Validate a draft and turn it into a node ready to be stored.
    pub fn prepare_new(&self, id: NodeId, draft: NodeDraft, now: DateTime<Utc>) -> DomainResult<Node> {
        let draft = NodeDraft {
            name: trimmed(draft.name),
            email: trimmed(draft.email),
            country: trimmed(draft.country),
            city: trimmed(draft.city),
            street: trimmed(draft.street),
            house_number: trimmed(draft.house_number),
            ..draft
        };
        let mut errors = FieldErrors::new();
        check_descriptive(
            &mut errors,
            &draft.name,
            &draft.email,
            &draft.country,
            &draft.city,
            &draft.street,
            &draft.house_number,
        );
        let debt = match draft.debt {
            None => zero_debt(),
            Some(value) => match normalize_debt(value) {
                Ok(d) => d,
                Err(msg) => {
                    errors.push("debt", msg);
                    zero_debt()
                }
            },
        };
        errors.into_result()?;

        let level = self.level_for(&Placement {
            id: None,
            node_type: draft.node_type,
            supplier: draft.supplier,
        })?;
        debug!("prepare_new: id={} level={}", id, level);

        Ok(Node {
            id,
            name: draft.name,
            node_type: draft.node_type,
            email: draft.email,
            country: draft.country,
            city: draft.city,
            street: draft.street,
            house_number: draft.house_number,
            supplier: draft.supplier,
            hierarchy_level: level,
            debt,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a general patch to `current` and re-derive its level.
    ///
    /// The level is recomputed on every save, even when the supplier did not
    /// change, so a re-saved node picks up its supplier's current level.
    pub fn prepare_update(
        &self,
        current: &Node,
        patch: NodePatch,
        now: DateTime<Utc>,
    ) -> DomainResult<Node> {
        let mut node = current.clone();
        if let Some(v) = patch.name {
            node.name = trimmed(v);
        }
        if let Some(v) = patch.node_type {
            node.node_type = v;
        }
        if let Some(v) = patch.email {
            node.email = trimmed(v);
        }
        if let Some(v) = patch.country {
            node.country = trimmed(v);
        }
        if let Some(v) = patch.city {
            node.city = trimmed(v);
        }
        if let Some(v) = patch.street {
            node.street = trimmed(v);
        }
        if let Some(v) = patch.house_number {
            node.house_number = trimmed(v);
        }
        if let Some(v) = patch.supplier {
            node.supplier = v;
        }

        let mut errors = FieldErrors::new();
        check_descriptive(
            &mut errors,
            &node.name,
            &node.email,
            &node.country,
            &node.city,
            &node.street,
            &node.house_number,
        );
        errors.into_result()?;

        node.hierarchy_level = self.level_for(&Placement {
            id: Some(node.id),
            node_type: node.node_type,
            supplier: node.supplier,
        })?;
        node.updated_at = now;
        debug!(
            "prepare_update: id={} level {} -> {}",
            node.id, current.hierarchy_level, node.hierarchy_level
        );
        Ok(node)
    }
}

fn trimmed(value: String) -> String {
    value.trim().to_string()
}

fn check_descriptive(
    errors: &mut FieldErrors,
    name: &str,
    email: &str,
    country: &str,
    city: &str,
    street: &str,
    house_number: &str,
) {
    errors.text("name", name, NAME_MAX);
    errors.email("email", email);
    errors.text("country", country, COUNTRY_MAX);
    errors.text("city", city, CITY_MAX);
    errors.text("street", street, STREET_MAX);
    errors.text("house_number", house_number, HOUSE_NUMBER_MAX);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use rust_decimal::Decimal;

    fn draft(name: &str, node_type: NodeType, supplier: Option<NodeId>) -> NodeDraft {
        NodeDraft {
            name: name.into(),
            node_type,
            email: "info@example.com".into(),
            country: "Россия".into(),
            city: "Москва".into(),
            street: "Тверская".into(),
            house_number: "1".into(),
            supplier,
            debt: None,
        }
    }

    fn add(store: &mut NodeStore, d: NodeDraft) -> Node {
        let id = store.allocate_node_id();
        let node = HierarchyEngine::new(store)
            .prepare_new(id, d, Utc::now())
            .unwrap();
        store.insert_node(node.clone()).unwrap();
        node
    }

    #[test]
    fn given_chain_when_created_then_levels_increase_by_one() {
        let mut store = NodeStore::new();
        let f = add(&mut store, draft("F", NodeType::Factory, None));
        let r = add(&mut store, draft("R", NodeType::RetailNetwork, Some(f.id)));
        let e = add(&mut store, draft("E", NodeType::Entrepreneur, Some(r.id)));
        assert_eq!(
            (f.hierarchy_level, r.hierarchy_level, e.hierarchy_level),
            (0, 1, 2)
        );
        assert_eq!(f.debt.to_string(), "0.00");
    }

    #[test]
    fn given_factory_with_supplier_when_prepared_then_invalid() {
        let mut store = NodeStore::new();
        let f = add(&mut store, draft("F", NodeType::Factory, None));
        let err = HierarchyEngine::new(&store)
            .prepare_new(NodeId(99), draft("F2", NodeType::Factory, Some(f.id)), Utc::now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field_errors()[0].field, "supplier");
    }

    #[test]
    fn given_retail_without_supplier_when_prepared_then_invalid() {
        let store = NodeStore::new();
        let err = HierarchyEngine::new(&store)
            .prepare_new(NodeId(1), draft("R", NodeType::RetailNetwork, None), Utc::now())
            .unwrap_err();
        assert_eq!(err.field_errors()[0].field, "supplier");
    }

    #[test]
    fn given_missing_supplier_when_prepared_then_reference_error() {
        let store = NodeStore::new();
        let err = HierarchyEngine::new(&store)
            .prepare_new(NodeId(1), draft("R", NodeType::RetailNetwork, Some(NodeId(7))), Utc::now())
            .unwrap_err();
        assert_eq!(err, DomainError::UnknownSupplier(NodeId(7)));
    }

    #[test]
    fn given_negative_debt_when_prepared_then_invalid() {
        let store = NodeStore::new();
        let mut d = draft("F", NodeType::Factory, None);
        d.debt = Some(Decimal::new(-5, 0));
        let err = HierarchyEngine::new(&store)
            .prepare_new(NodeId(1), d, Utc::now())
            .unwrap_err();
        assert_eq!(err.field_errors()[0].field, "debt");
    }

    #[test]
    fn given_self_as_supplier_when_updating_then_invalid() {
        let mut store = NodeStore::new();
        let f = add(&mut store, draft("F", NodeType::Factory, None));
        let r = add(&mut store, draft("R", NodeType::RetailNetwork, Some(f.id)));
        let patch = NodePatch {
            supplier: Some(Some(r.id)),
            ..Default::default()
        };
        let err = HierarchyEngine::new(&store)
            .prepare_update(&r, patch, Utc::now())
            .unwrap_err();
        assert!(err.to_string().contains("own supplier"));
    }

    #[test]
    fn given_descendant_as_supplier_when_updating_then_invalid() {
        let mut store = NodeStore::new();
        let f = add(&mut store, draft("F", NodeType::Factory, None));
        let r = add(&mut store, draft("R", NodeType::RetailNetwork, Some(f.id)));
        let e = add(&mut store, draft("E", NodeType::Entrepreneur, Some(r.id)));
        let patch = NodePatch {
            supplier: Some(Some(e.id)),
            ..Default::default()
        };
        let err = HierarchyEngine::new(&store)
            .prepare_update(&r, patch, Utc::now())
            .unwrap_err();
        assert_eq!(err.field_errors()[0].field, "supplier");
    }

    #[test]
    fn given_new_supplier_when_updating_then_level_follows_it() {
        let mut store = NodeStore::new();
        let f = add(&mut store, draft("F", NodeType::Factory, None));
        let r1 = add(&mut store, draft("R1", NodeType::RetailNetwork, Some(f.id)));
        let r2 = add(&mut store, draft("R2", NodeType::RetailNetwork, Some(f.id)));
        let patch = NodePatch {
            supplier: Some(Some(r1.id)),
            ..Default::default()
        };
        let moved = HierarchyEngine::new(&store)
            .prepare_update(&r2, patch, Utc::now())
            .unwrap();
        assert_eq!(moved.hierarchy_level, 2);
        assert_eq!(moved.created_at, r2.created_at);
    }
}
