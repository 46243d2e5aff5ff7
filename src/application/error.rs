//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, ErrorKind};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("storage error: {context}")]
    Storage {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    /// Kind of the underlying domain error, if this is one.
    pub fn domain_kind(&self) -> Option<ErrorKind> {
        match self {
            ApplicationError::Domain(e) => Some(e.kind()),
            _ => None,
        }
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ApplicationError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
