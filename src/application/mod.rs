//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on boundary traits.

pub mod error;
pub mod error_ext;
pub mod services;
pub mod shared;
pub mod views;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use shared::SharedStore;
pub use views::{ClearDebtOutcome, DeletionReceipt, NodeDetail, NodeSummary, ProductView};
