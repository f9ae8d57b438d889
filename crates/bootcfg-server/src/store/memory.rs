//! In-memory storage backend
//!
//! Simple storage for testing and development.

use super::{Result, Store, StoreError};
use bootcfg_model::{Group, Profile, TemplateNamespace};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

fn poisoned<T>(e: PoisonError<T>) -> StoreError {
    StoreError::Database(format!("lock poisoned: {}", e))
}

/// In-memory storage backend
pub struct MemoryStore {
    groups: RwLock<HashMap<String, Group>>,
    profiles: RwLock<HashMap<String, Profile>>,
    /// Keyed by (namespace, name)
    templates: RwLock<HashMap<(TemplateNamespace, String), String>>,
}

impl MemoryStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            profiles: RwLock::new(HashMap::new()),
            templates: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn group_put(&self, group: &Group) -> Result<()> {
        let mut guard = self.groups.write().map_err(poisoned)?;
        guard.insert(group.id.clone(), group.clone());
        Ok(())
    }

    fn group_get(&self, id: &str) -> Result<Group> {
        let guard = self.groups.read().map_err(poisoned)?;
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::GroupNotFound(id.to_string()))
    }

    fn group_list(&self) -> Result<Vec<Group>> {
        let guard = self.groups.read().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }

    fn profile_put(&self, profile: &Profile) -> Result<()> {
        let mut guard = self.profiles.write().map_err(poisoned)?;
        guard.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    fn profile_get(&self, id: &str) -> Result<Profile> {
        let guard = self.profiles.read().map_err(poisoned)?;
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ProfileNotFound(id.to_string()))
    }

    fn profile_list(&self) -> Result<Vec<Profile>> {
        let guard = self.profiles.read().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }

    fn template_put(&self, namespace: TemplateNamespace, name: &str, contents: &str) -> Result<()> {
        let mut guard = self.templates.write().map_err(poisoned)?;
        guard.insert((namespace, name.to_string()), contents.to_string());
        Ok(())
    }

    fn template_get(&self, namespace: TemplateNamespace, name: &str) -> Result<String> {
        let guard = self.templates.read().map_err(poisoned)?;
        guard
            .get(&(namespace, name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::TemplateNotFound {
                namespace,
                name: name.to_string(),
            })
    }
}
