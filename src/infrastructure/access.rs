//! Access policy backed by the configured actor.

use tracing::debug;

use crate::config::ActorSettings;
use crate::infrastructure::traits::AccessPolicy;

/// Authorizes the actor named in the settings when it is authenticated and active.
#[derive(Debug, Clone)]
pub struct ActorPolicy {
    actor: ActorSettings,
}

impl ActorPolicy {
    pub fn new(actor: ActorSettings) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &ActorSettings {
        &self.actor
    }
}

impl AccessPolicy for ActorPolicy {
    fn is_authorized_actor(&self) -> bool {
        let ok = self.actor.authenticated && self.actor.active;
        debug!(
            "access: actor={} authenticated={} active={} -> {}",
            self.actor.name, self.actor.authenticated, self.actor.active, ok
        );
        ok
    }
}
