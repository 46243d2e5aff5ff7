//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::{ProductService, RegistryService};
use crate::application::SharedStore;
use crate::config::Settings;
use crate::infrastructure::access::ActorPolicy;
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::storage::JsonFileStorage;
use crate::infrastructure::traits::{AccessPolicy, Storage};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Persistence backend
    pub storage: Arc<dyn Storage>,

    /// Authorization gate shared by all services
    pub policy: Arc<dyn AccessPolicy>,

    pub registry: RegistryService,
    pub products: ProductService,
}

impl ServiceContainer {
    /// Create a container backed by the snapshot file in `settings.data_dir`.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        std::fs::create_dir_all(&settings.data_dir).map_err(|e| {
            InfraError::io(
                format!("create data directory {}", settings.data_dir.display()),
                e,
            )
        })?;
        let storage = Arc::new(JsonFileStorage::in_dir(&settings.data_dir));
        let policy = Arc::new(ActorPolicy::new(settings.actor.clone()));
        Self::with_deps(settings, storage, policy)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        storage: Arc<dyn Storage>,
        policy: Arc<dyn AccessPolicy>,
    ) -> InfraResult<Self> {
        debug!("container: storage={}", storage.describe());
        let settings = Arc::new(settings);
        let shared = Arc::new(SharedStore::open(storage.clone())?);

        Ok(Self {
            settings,
            registry: RegistryService::new(shared.clone(), policy.clone()),
            products: ProductService::new(shared, policy.clone()),
            storage,
            policy,
        })
    }
}
