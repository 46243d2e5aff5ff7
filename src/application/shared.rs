//! Shared, transactional access to the registry store.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, instrument};

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{DomainResult, NodeStore};
use crate::infrastructure::traits::Storage;

/// The committed registry plus the storage it is persisted to.
///
/// Every operation starts from the state currently committed in storage, so
/// handles in other processes see each other's writes. A mutation holds the
/// storage write lock while it loads, applies, and saves a private working
/// copy; a failed validation or a failed save leaves both memory and storage
/// as they were.
pub struct SharedStore {
    storage: Arc<dyn Storage>,
    committed: Mutex<NodeStore>,
}

impl SharedStore {
    /// Load the committed state from `storage`.
    pub fn open(storage: Arc<dyn Storage>) -> ApplicationResult<Self> {
        let store = storage
            .load()
            .with_storage_context("load registry", &storage.describe())?;
        debug!(
            "open: {} node(s) from {}",
            store.node_count(),
            storage.describe()
        );
        Ok(Self {
            storage,
            committed: Mutex::new(store),
        })
    }

    fn lock(&self) -> MutexGuard<'_, NodeStore> {
        // mutations only ever swap in complete working copies
        self.committed.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reload(&self, action: &str) -> ApplicationResult<NodeStore> {
        self.storage
            .load()
            .with_storage_context(action, &self.storage.describe())
    }

    /// Run a read-only query against the committed state.
    pub fn read<T>(&self, f: impl FnOnce(&NodeStore) -> DomainResult<T>) -> ApplicationResult<T> {
        let mut guard = self.lock();
        *guard = self.reload("load registry")?;
        Ok(f(&guard)?)
    }

    /// Apply `f` atomically: lock, reload, validate, persist, then commit.
    #[instrument(level = "debug", skip(self, f))]
    pub fn transact<T>(
        &self,
        action: &str,
        f: impl FnOnce(&mut NodeStore) -> DomainResult<T>,
    ) -> ApplicationResult<T> {
        let mut guard = self.lock();
        let _write = self
            .storage
            .lock()
            .with_storage_context(action, &self.storage.describe())?;
        let mut working = self.reload(action)?;
        let out = f(&mut working)?;
        self.storage
            .save(&working)
            .with_storage_context(action, &self.storage.describe())?;
        *guard = working;
        Ok(out)
    }
}
