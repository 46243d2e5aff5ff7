//! Error conversion helpers for storage operations
//!
//! Provides extension traits for cleaner error handling with context.

use std::io;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add storage context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// storage.save(&working)
    ///     .with_storage_context("create node", &storage.describe())?;
    /// ```
    fn with_storage_context(self, action: &str, location: &str) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_storage_context(self, action: &str, location: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Storage {
            context: format!("{}: {}", action, location),
            source: e,
        })
    }
}
