//! Debt guard: the only code that changes a node's debt after creation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::entities::{zero_debt, Node, NodeId};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::store::NodeStore;

/// Name of the write-protected field.
pub const DEBT_FIELD: &str = "debt";

pub struct DebtGuard;

impl DebtGuard {
    /// Refuse a general update whose field set mentions `debt`.
    ///
    /// Runs before anything else of the update is looked at, so the whole
    /// request fails even when every other field is valid.
    pub fn reject_debt_in_general_update<'a, I>(fields: I) -> DomainResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if fields
            .into_iter()
            .any(|f| f.trim().eq_ignore_ascii_case(DEBT_FIELD))
        {
            return Err(DomainError::ForbiddenField {
                field: DEBT_FIELD.to_string(),
            });
        }
        Ok(())
    }

    /// Reset one node's debt to `0.00`. Clearing a zero debt is a no-op value-wise
    /// but still counts as a save and refreshes `updated_at`.
    pub fn clear_debt(store: &mut NodeStore, id: NodeId, now: DateTime<Utc>) -> DomainResult<Node> {
        let node = store.node_mut(id).ok_or(DomainError::NodeNotFound(id))?;
        debug!("clear_debt: id={} was={}", id, node.debt);
        reset(node, now);
        Ok(node.clone())
    }

    /// Reset the debt of every existing node in `ids`. Unknown ids are ignored.
    ///
    /// Returns the number of nodes that were reset.
    pub fn bulk_clear_debt(store: &mut NodeStore, ids: &BTreeSet<NodeId>, now: DateTime<Utc>) -> usize {
        let mut count = 0;
        for id in ids {
            if let Some(node) = store.node_mut(*id) {
                reset(node, now);
                count += 1;
            }
        }
        debug!("bulk_clear_debt: requested={} reset={}", ids.len(), count);
        count
    }
}

fn reset(node: &mut Node, now: DateTime<Utc>) {
    node.debt = zero_debt();
    node.updated_at = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NodeType;
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn store_with_debts(debts: &[Decimal]) -> NodeStore {
        let mut store = NodeStore::new();
        let now = Utc::now();
        for debt in debts {
            let id = store.allocate_node_id();
            store
                .insert_node(Node {
                    id,
                    name: format!("n{id}"),
                    node_type: NodeType::Factory,
                    email: "x@y.z".into(),
                    country: "C".into(),
                    city: "C".into(),
                    street: "S".into(),
                    house_number: "1".into(),
                    supplier: None,
                    hierarchy_level: 0,
                    debt: *debt,
                    created_at: now,
                    updated_at: now,
                })
                .unwrap();
        }
        store
    }

    #[rstest]
    #[case(&["debt"])]
    #[case(&["name", "debt"])]
    #[case(&["DEBT"])]
    fn given_fields_with_debt_when_screened_then_forbidden(#[case] fields: &[&str]) {
        let err = DebtGuard::reject_debt_in_general_update(fields.iter().copied()).unwrap_err();
        assert!(matches!(err, DomainError::ForbiddenField { .. }));
    }

    #[test]
    fn given_fields_without_debt_when_screened_then_ok() {
        DebtGuard::reject_debt_in_general_update(["name", "city"]).unwrap();
    }

    #[test]
    fn given_debt_when_cleared_then_exactly_zero() {
        let mut store = store_with_debts(&[Decimal::new(15000050, 2)]);
        let cleared = DebtGuard::clear_debt(&mut store, NodeId(1), Utc::now()).unwrap();
        assert_eq!(cleared.debt, Decimal::ZERO);
        assert_eq!(cleared.debt.to_string(), "0.00");
    }

    #[test]
    fn given_zero_debt_when_cleared_again_then_succeeds() {
        let mut store = store_with_debts(&[Decimal::ZERO]);
        DebtGuard::clear_debt(&mut store, NodeId(1), Utc::now()).unwrap();
        DebtGuard::clear_debt(&mut store, NodeId(1), Utc::now()).unwrap();
    }

    #[test]
    fn given_unknown_node_when_cleared_then_not_found() {
        let mut store = NodeStore::new();
        let err = DebtGuard::clear_debt(&mut store, NodeId(3), Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::NodeNotFound(NodeId(3)));
    }

    #[test]
    fn given_mixed_ids_when_bulk_cleared_then_counts_existing_only() {
        let mut store = store_with_debts(&[Decimal::new(100, 0), Decimal::new(5, 1)]);
        let ids: BTreeSet<_> = [NodeId(1), NodeId(2), NodeId(42)].into_iter().collect();
        assert_eq!(DebtGuard::bulk_clear_debt(&mut store, &ids, Utc::now()), 2);
        assert!(store.nodes().all(|n| n.debt.is_zero()));
    }
}
