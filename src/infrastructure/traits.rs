//! I/O boundary traits for testability
//!
//! These traits abstract the persistence engine and the authorization gate,
//! allowing services to be tested with in-memory implementations.

use std::fs::File;
use std::io;
use std::sync::MutexGuard;

use fs2::FileExt;

use crate::domain::NodeStore;

/// Exclusive write access to a storage backend, released on drop.
///
/// Held across load, modify and save, so writers in other processes (or other
/// handles on the same backend) never overwrite each other's commits.
#[derive(Debug)]
pub enum StorageLock<'a> {
    /// Advisory lock on a file next to the snapshot.
    File(File),
    /// Writer lock of an in-process backend.
    Local(MutexGuard<'a, ()>),
}

impl Drop for StorageLock<'_> {
    fn drop(&mut self) {
        if let StorageLock::File(file) = self {
            // closing the handle releases the lock as well
            let _ = FileExt::unlock(&*file);
        }
    }
}

/// Persistence engine for the registry.
///
/// `save` must be all-or-nothing: after a failed save the previously saved
/// state is still what `load` returns. Writers take [`Storage::lock`] before
/// loading the state they are about to modify.
pub trait Storage: Send + Sync {
    /// Load the committed registry. A store that was never saved loads empty.
    fn load(&self) -> io::Result<NodeStore>;

    /// Durably replace the committed registry.
    fn save(&self, store: &NodeStore) -> io::Result<()>;

    /// Block until this handle holds exclusive write access.
    fn lock(&self) -> io::Result<StorageLock<'_>>;

    /// Human readable location, for messages.
    fn describe(&self) -> String;
}

/// Authorization gate consulted before every operation.
pub trait AccessPolicy: Send + Sync {
    /// The acting principal is authenticated and active.
    fn is_authorized_actor(&self) -> bool;
}
