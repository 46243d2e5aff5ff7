//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod debt;
pub mod deletion;
pub mod draft;
pub mod entities;
pub mod error;
pub mod filter;
pub mod hierarchy;
pub mod stats;
pub mod store;
pub mod validation;

pub use arena::{NodeData, SupplyTree, TreeNode};
pub use debt::{DebtGuard, DEBT_FIELD};
pub use deletion::{Deleted, DeletionGuard};
pub use draft::{FieldSet, NodeDraft, NodePatch, ProductDraft, ProductPatch, UpdateMode};
pub use entities::*;
pub use error::{DomainError, DomainResult, ErrorKind, FieldError};
pub use filter::{
    NodeFilter, NodeSort, NodeSortKey, Page, PageRequest, ProductFilter, ProductSort,
    ProductSortKey,
};
pub use hierarchy::{HierarchyEngine, Placement};
pub use stats::Stats;
pub use store::{NodeStore, Snapshot};
