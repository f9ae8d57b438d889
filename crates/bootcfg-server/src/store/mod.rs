//! Storage backends for bootcfg
//!
//! This module provides the `Store` trait and its implementations:
//! - `MemoryStore` - In-memory storage for testing
//! - `FileStore` - JSON records and raw templates under a data directory
//!
//! Every `get` reports absence as a distinct not-found error rather than
//! an empty value.

mod file;
mod memory;


pub use file::FileStore;
pub use memory::MemoryStore;

use bootcfg_model::{Group, Profile, TemplateNamespace};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors from storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("{namespace} template not found: {name}")]
    TemplateNotFound {
        namespace: TemplateNamespace,
        name: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Whether this error reports a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::GroupNotFound(_)
                | StoreError::ProfileNotFound(_)
                | StoreError::TemplateNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage backend trait for bootcfg
///
/// Implementations provide persistence for Groups, Profiles and the three
/// template namespaces. The trait is object-safe and can be used with
/// `Arc<dyn Store>`. Calls are synchronous: template `include` fetches
/// from inside template evaluation.
pub trait Store: Send + Sync {
    // === Group Operations ===

    /// Store or update a Group
    fn group_put(&self, group: &Group) -> Result<()>;

    /// Get a Group by id
    fn group_get(&self, id: &str) -> Result<Group>;

    /// List all Groups
    fn group_list(&self) -> Result<Vec<Group>>;

    // === Profile Operations ===

    /// Store or update a Profile
    fn profile_put(&self, profile: &Profile) -> Result<()>;

    /// Get a Profile by id
    fn profile_get(&self, id: &str) -> Result<Profile>;

    /// List all Profiles
    fn profile_list(&self) -> Result<Vec<Profile>>;

    // === Template Operations ===

    /// Store or update template content
    fn template_put(&self, namespace: TemplateNamespace, name: &str, contents: &str) -> Result<()>;

    /// Get template content by name
    fn template_get(&self, namespace: TemplateNamespace, name: &str) -> Result<String>;

    fn ignition_put(&self, name: &str, contents: &str) -> Result<()> {
        self.template_put(TemplateNamespace::Ignition, name, contents)
    }

    fn ignition_get(&self, name: &str) -> Result<String> {
        self.template_get(TemplateNamespace::Ignition, name)
    }

    fn cloud_put(&self, name: &str, contents: &str) -> Result<()> {
        self.template_put(TemplateNamespace::Cloud, name, contents)
    }

    fn cloud_get(&self, name: &str) -> Result<String> {
        self.template_get(TemplateNamespace::Cloud, name)
    }

    fn generic_put(&self, name: &str, contents: &str) -> Result<()> {
        self.template_put(TemplateNamespace::Generic, name, contents)
    }

    fn generic_get(&self, name: &str) -> Result<String> {
        self.template_get(TemplateNamespace::Generic, name)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default)]
pub enum StoreConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Records and templates under a data directory
    File { path: PathBuf },
}

/// Create a store from configuration
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn Store>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreConfig::File { path } => {
            let store = FileStore::open(path)?;
            Ok(Arc::new(store))
        }
    }
}
