//! In-memory [`ServiceRegistry`] implementation.

use chrono::Utc;
use sentra_kernel::orchestration::{
    BackendDescriptor, BackendHealth, Capability, ConfigError, ServiceRegistry,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registry handle shared between the router and the admin surface:
/// concurrent reads (resolve/lookup), exclusive serialized writes.
pub type SharedRegistry = Arc<RwLock<InMemoryServiceRegistry>>;

/// [`ServiceRegistry`] backed by a simple `HashMap`.
///
/// Suitable for single-node deployments.  Distributed/service-mesh
/// implementations belong in separate plugin crates.
#[derive(Default)]
pub struct InMemoryServiceRegistry {
    store: HashMap<String, BackendDescriptor>,
}

impl InMemoryServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a registry for shared use.
    pub fn shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }
}

impl ServiceRegistry for InMemoryServiceRegistry {
    fn register(&mut self, descriptor: BackendDescriptor) -> Result<(), ConfigError> {
        descriptor.validate()?;
        // Capability resolution must stay unambiguous: a different backend
        // already claiming this capability is rejected, not shadowed.
        if let Some(rival) = self
            .store
            .values()
            .find(|d| d.capability == descriptor.capability && d.name != descriptor.name)
        {
            return Err(ConfigError::AmbiguousCapability {
                capability: descriptor.capability,
                first: rival.name.clone(),
                second: descriptor.name.clone(),
            });
        }
        self.store.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    fn unregister(&mut self, name: &str) -> Result<(), ConfigError> {
        self.store
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ConfigError::BackendNotFound(name.to_string()))
    }

    fn lookup(&self, name: &str) -> Option<&BackendDescriptor> {
        self.store.get(name)
    }

    fn resolve(&self, capability: Capability) -> Option<&BackendDescriptor> {
        self.store.values().find(|d| d.capability == capability)
    }

    fn list_all(&self) -> Vec<&BackendDescriptor> {
        self.store.values().collect()
    }

    fn update_health(&mut self, name: &str, health: BackendHealth) -> Result<(), ConfigError> {
        self.store
            .get_mut(name)
            .map(|d| {
                d.health = health;
                d.last_checked = Some(Utc::now());
            })
            .ok_or_else(|| ConfigError::BackendNotFound(name.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
