//! Registry service
//!
//! Node operations: listing, lookup, create/update/delete and the debt
//! operations. Every call passes the access policy first; mutations run as a
//! single transaction on the shared store.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::application::shared::SharedStore;
use crate::application::views::{ClearDebtOutcome, DeletionReceipt, NodeDetail, NodeSummary};
use crate::application::ApplicationResult;
use crate::domain::{
    DebtGuard, DeletionGuard, DomainError, DomainResult, FieldSet, HierarchyEngine, NodeDraft,
    NodeFilter, NodeId, NodePatch, NodeSort, Page, PageRequest, Stats, SupplyTree, UpdateMode,
};
use crate::infrastructure::traits::AccessPolicy;

/// Filter, ordering and page of a node listing.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeQuery {
    pub filter: NodeFilter,
    pub sort: NodeSort,
    pub page: PageRequest,
}

impl NodeQuery {
    /// Everything, default order, one page.
    pub fn all() -> Self {
        Self {
            filter: NodeFilter::default(),
            sort: NodeSort::default(),
            page: PageRequest::all(),
        }
    }
}

/// Service for node operations.
pub struct RegistryService {
    shared: Arc<SharedStore>,
    policy: Arc<dyn AccessPolicy>,
}

impl RegistryService {
    pub fn new(shared: Arc<SharedStore>, policy: Arc<dyn AccessPolicy>) -> Self {
        Self { shared, policy }
    }

    fn authorize(&self, operation: &str) -> DomainResult<()> {
        if self.policy.is_authorized_actor() {
            Ok(())
        } else {
            warn!("{}: refused by access policy", operation);
            Err(DomainError::Forbidden)
        }
    }

    /// Filtered, ordered page of node summaries.
    pub fn list_nodes(&self, query: &NodeQuery) -> ApplicationResult<Page<NodeSummary>> {
        self.authorize("list_nodes")?;
        debug!("list_nodes: {:?} sort={:?}", query.filter, query.sort);
        self.shared.read(|store| {
            let ordered: Vec<NodeSummary> = query
                .filter
                .apply(store.nodes(), query.sort)
                .into_iter()
                .map(|n| NodeSummary::from_node(n, store))
                .collect();
            Ok(Page::slice(ordered, query.page))
        })
    }

    pub fn get_node(&self, id: NodeId) -> ApplicationResult<NodeDetail> {
        self.authorize("get_node")?;
        debug!("get_node: id={}", id);
        self.shared
            .read(|store| Ok(NodeDetail::from_node(store.require_node(id)?, store)))
    }

    pub fn find_by_name(&self, name: &str) -> ApplicationResult<Option<NodeDetail>> {
        self.authorize("find_by_name")?;
        self.shared.read(|store| {
            Ok(store
                .find_node_by_name(name)
                .map(|n| NodeDetail::from_node(n, store)))
        })
    }

    pub fn create_node(&self, draft: NodeDraft) -> ApplicationResult<NodeDetail> {
        self.authorize("create_node")?;
        debug!(
            "create_node: name={} type={} supplier={:?}",
            draft.name, draft.node_type, draft.supplier
        );
        let detail = self.shared.transact("create node", |store| {
            let id = store.allocate_node_id();
            let node = HierarchyEngine::new(store).prepare_new(id, draft, Utc::now())?;
            store.insert_node(node)?;
            Ok(NodeDetail::from_node(store.require_node(id)?, store))
        })?;
        info!(
            "created node {} '{}' at level {}",
            detail.id, detail.name, detail.hierarchy_level
        );
        Ok(detail)
    }

    /// Apply a typed general update. The patch type cannot carry a debt.
    pub fn update_general_fields(
        &self,
        id: NodeId,
        patch: NodePatch,
    ) -> ApplicationResult<NodeDetail> {
        self.authorize("update_general_fields")?;
        debug!("update_general_fields: id={} {:?}", id, patch);
        let (detail, clients) = self.shared.transact("update node", |store| {
            let current = store.require_node(id)?;
            let updated = HierarchyEngine::new(store).prepare_update(current, patch, Utc::now())?;
            let level_changed = updated.hierarchy_level != current.hierarchy_level;
            store.replace_node(updated)?;
            let clients = if level_changed {
                store.clients_of(id)
            } else {
                Vec::new()
            };
            Ok((NodeDetail::from_node(store.require_node(id)?, store), clients))
        })?;
        if !clients.is_empty() {
            warn!(
                "node {} moved to level {}; {} client(s) keep their recorded level until re-saved",
                id,
                detail.hierarchy_level,
                clients.len()
            );
        }
        info!("updated node {} '{}'", detail.id, detail.name);
        Ok(detail)
    }

    /// Apply an untyped field set. A field set naming `debt` is refused
    /// before any other field is looked at.
    pub fn update_node_fields(
        &self,
        id: NodeId,
        fields: &FieldSet,
        mode: UpdateMode,
    ) -> ApplicationResult<NodeDetail> {
        self.authorize("update_node_fields")?;
        if let Err(e) = DebtGuard::reject_debt_in_general_update(fields.keys().map(String::as_str))
        {
            warn!("update_node_fields: id={} refused: {}", id, e);
            return Err(e.into());
        }
        let patch = NodePatch::from_fields(fields, mode)?;
        self.update_general_fields(id, patch)
    }

    pub fn delete_node(&self, id: NodeId) -> ApplicationResult<DeletionReceipt> {
        self.authorize("delete_node")?;
        debug!("delete_node: id={}", id);
        let deleted = self
            .shared
            .transact("delete node", |store| DeletionGuard::delete(store, id))
            .inspect_err(|e| warn!("delete_node: id={} refused: {}", id, e))?;
        info!(
            "deleted node {} '{}' with {} product(s)",
            deleted.node.id,
            deleted.node.name,
            deleted.products.len()
        );
        Ok(DeletionReceipt {
            node: deleted.node.id,
            name: deleted.node.name,
            products_removed: deleted.products.len(),
        })
    }

    pub fn clear_debt(&self, id: NodeId) -> ApplicationResult<ClearDebtOutcome> {
        self.authorize("clear_debt")?;
        debug!("clear_debt: id={}", id);
        let outcome = self.shared.transact("clear debt", |store| {
            let node = DebtGuard::clear_debt(store, id, Utc::now())?;
            Ok(ClearDebtOutcome {
                message: format!("Debt of '{}' cleared", node.name),
                node: NodeDetail::from_node(&node, store),
            })
        })?;
        info!("{}", outcome.message);
        Ok(outcome)
    }

    /// Clear the debt of every existing node in `ids` in one transaction.
    pub fn bulk_clear_debt(&self, ids: &BTreeSet<NodeId>) -> ApplicationResult<usize> {
        self.authorize("bulk_clear_debt")?;
        debug!("bulk_clear_debt: {} id(s)", ids.len());
        let count = self.shared.transact("bulk clear debt", |store| {
            Ok(DebtGuard::bulk_clear_debt(store, ids, Utc::now()))
        })?;
        info!("cleared debt of {} node(s)", count);
        Ok(count)
    }

    pub fn statistics(&self) -> ApplicationResult<Stats> {
        self.authorize("statistics")?;
        self.shared.read(|store| Ok(Stats::summarize(store.nodes())))
    }

    /// One tree per root of the supply chain.
    pub fn supply_trees(&self) -> ApplicationResult<Vec<SupplyTree>> {
        self.authorize("supply_trees")?;
        self.shared.read(|store| Ok(SupplyTree::build_forest(store)))
    }
}
