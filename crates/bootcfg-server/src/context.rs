//! Render context construction
//!
//! A Group's metadata document is the base context. Selector entries are
//! added under lower-cased keys, additive only: a selector key that lands
//! on an existing metadata key is an error rather than an override.

use crate::render::RenderError;
use bootcfg_model::{Group, Metadata, MetadataValue};
use serde::Serialize;

/// Data a Group's templates are rendered with
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderContext {
    data: Metadata,
}

impl RenderContext {
    /// Build the context for a matched Group
    pub fn for_group(group: &Group) -> Result<Self, RenderError> {
        let mut data = group.metadata.clone();
        for (key, value) in &group.selector {
            let key = key.to_lowercase();
            if data.contains_key(&key) {
                return Err(RenderError::ContextCollision(key));
            }
            data.insert(key, MetadataValue::String(value.clone()));
        }
        Ok(Self { data })
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.data.get(key)
    }

    pub fn as_metadata(&self) -> &Metadata {
        &self.data
    }
}
