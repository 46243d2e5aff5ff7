//! Domain-level errors (no external dependencies)

use std::fmt;

use itertools::Itertools;
use thiserror::Error;

use crate::domain::entities::{NodeId, ProductId};

/// A single rejected field with a human readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Coarse classification of a [`DomainError`], used for exit codes and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    ForbiddenField,
    ReferentialIntegrity,
    NotFound,
    Forbidden,
    Conflict,
}

/// Domain errors represent business rule violations.
/// All of them are raised before anything is written.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("validation failed: {}", .0.iter().join("; "))]
    Validation(Vec<FieldError>),

    #[error("field '{field}' cannot be changed by an update; use clear-debt instead")]
    ForbiddenField { field: String },

    #[error("supplier {0} does not exist")]
    UnknownSupplier(NodeId),

    #[error(
        "node {node} still supplies {} client(s): {}",
        .dependents.len(),
        .dependents.iter().join(", ")
    )]
    DependentsExist {
        node: NodeId,
        dependents: Vec<NodeId>,
    },

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("node {node} already has product '{name}' model '{model}'")]
    DuplicateProduct {
        node: NodeId,
        name: String,
        model: String,
    },

    #[error("access denied: an authenticated, active actor is required")]
    Forbidden,

    #[error("corrupt registry data: {0}")]
    Corrupt(String),
}

impl DomainError {
    /// Shorthand for a validation error on one field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Corrupt(_) => ErrorKind::Validation,
            Self::ForbiddenField { .. } => ErrorKind::ForbiddenField,
            Self::UnknownSupplier(_) | Self::DependentsExist { .. } => {
                ErrorKind::ReferentialIntegrity
            }
            Self::NodeNotFound(_) | Self::ProductNotFound(_) => ErrorKind::NotFound,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::DuplicateProduct { .. } => ErrorKind::Conflict,
        }
    }

    /// Field errors carried by a validation failure, empty for other kinds.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
