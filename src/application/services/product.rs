//! Product service
//!
//! Products are always scoped to the node that owns them.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::shared::SharedStore;
use crate::application::views::ProductView;
use crate::application::ApplicationResult;
use crate::domain::validation::check_product_fields;
use crate::domain::{
    DomainError, DomainResult, FieldSet, Page, PageRequest, Product, ProductDraft, ProductFilter,
    ProductId, ProductPatch, ProductSort, UpdateMode,
};
use crate::infrastructure::traits::AccessPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub filter: ProductFilter,
    pub sort: ProductSort,
    pub page: PageRequest,
}

impl ProductQuery {
    pub fn all() -> Self {
        Self {
            filter: ProductFilter::default(),
            sort: ProductSort::default(),
            page: PageRequest::all(),
        }
    }
}

/// Service for product operations.
pub struct ProductService {
    shared: Arc<SharedStore>,
    policy: Arc<dyn AccessPolicy>,
}

impl ProductService {
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

    pub fn list_products(&self, query: &ProductQuery) -> ApplicationResult<Page<ProductView>> {
        self.authorize("list_products")?;
        debug!("list_products: {:?} sort={:?}", query.filter, query.sort);
        self.shared.read(|store| {
            let mut hits: Vec<&Product> = store
                .products()
                .filter(|p| query.filter.matches(p, store.node(p.node)))
                .collect();
            hits.sort_by(|a, b| query.sort.compare(a, b));
            let views = hits
                .into_iter()
                .map(|p| ProductView::from_product(p, store.node(p.node)))
                .collect();
            Ok(Page::slice(views, query.page))
        })
    }

    pub fn get_product(&self, id: ProductId) -> ApplicationResult<ProductView> {
        self.authorize("get_product")?;
        self.shared.read(|store| {
            let product = store.require_product(id)?;
            Ok(ProductView::from_product(product, store.node(product.node)))
        })
    }

    pub fn create_product(&self, draft: ProductDraft) -> ApplicationResult<ProductView> {
        self.authorize("create_product")?;
        debug!(
            "create_product: node={} name={} model={}",
            draft.node, draft.name, draft.model
        );
        let view = self
            .shared
            .transact("create product", |store| {
                store.require_node(draft.node)?;
                check_product_fields(&draft.name, &draft.model)?;
                let product = Product {
                    id: store.allocate_product_id(),
                    node: draft.node,
                    name: draft.name.trim().to_string(),
                    model: draft.model.trim().to_string(),
                    release_date: draft.release_date,
                };
                let id = product.id;
                store.insert_product(product)?;
                let product = store.require_product(id)?;
                Ok(ProductView::from_product(product, store.node(product.node)))
            })
            .inspect_err(|e| warn!("create_product: refused: {}", e))?;
        info!("created product {} '{}' for node {}", view.id, view.name, view.node);
        Ok(view)
    }

    pub fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> ApplicationResult<ProductView> {
        self.authorize("update_product")?;
        debug!("update_product: id={} {:?}", id, patch);
        let view = self.shared.transact("update product", |store| {
            let mut product = store.require_product(id)?.clone();
            if let Some(v) = patch.name {
                product.name = v.trim().to_string();
            }
            if let Some(v) = patch.model {
                product.model = v.trim().to_string();
            }
            if let Some(v) = patch.release_date {
                product.release_date = v;
            }
            check_product_fields(&product.name, &product.model)?;
            store.replace_product(product)?;
            let product = store.require_product(id)?;
            Ok(ProductView::from_product(product, store.node(product.node)))
        })?;
        info!("updated product {} '{}'", view.id, view.name);
        Ok(view)
    }

    pub fn update_product_fields(
        &self,
        id: ProductId,
        fields: &FieldSet,
        mode: UpdateMode,
    ) -> ApplicationResult<ProductView> {
        self.authorize("update_product_fields")?;
        let patch = ProductPatch::from_fields(fields, mode)?;
        self.update_product(id, patch)
    }

    pub fn delete_product(&self, id: ProductId) -> ApplicationResult<ProductView> {
        self.authorize("delete_product")?;
        let view = self.shared.transact("delete product", |store| {
            let product = store.remove_product(id)?;
            Ok(ProductView::from_product(&product, store.node(product.node)))
        })?;
        info!("deleted product {} '{}'", view.id, view.name);
        Ok(view)
    }
}
