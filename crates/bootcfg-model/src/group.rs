//! Machine Groups
//!
//! A Group associates a label selector and metadata with a Profile.
//! Groups are matched against the labels a machine presents when it
//! requests boot or config payloads.

use crate::{MacAddr, Metadata, MetadataValue, ModelError, Result, MAC_LABEL};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Labels presented by a requesting machine (key -> value)
pub type Labels = BTreeMap<String, String>;

/// Required label pairs for a Group to match (key -> value)
pub type Selector = BTreeMap<String, String>;

/// Group resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Group {
    /// Unique identifier
    pub id: String,

    /// Human readable name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Id of the Profile this Group maps to
    #[serde(default)]
    pub profile: String,

    /// Required labels; empty matches every machine
    #[serde(default, skip_serializing_if = "Selector::is_empty")]
    pub selector: Selector,

    /// Structured metadata made available to templates
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Group {
    /// Create a new Group mapping to the given profile
    pub fn new(id: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            profile: profile.into(),
            ..Default::default()
        }
    }

    /// Set the human readable name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a selector requirement
    pub fn with_selector(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.selector.insert(key.into(), value.into());
        self
    }

    /// Add a top-level metadata field
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Number of selector entries; more entries means a more specific Group
    pub fn specificity(&self) -> usize {
        self.selector.len()
    }

    /// Whether every selector pair is present and equal in `labels`
    pub fn matches(&self, labels: &Labels) -> bool {
        self.selector
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }

    /// Validate the group resource
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(ModelError::MissingField("id".to_string()));
        }

        for (key, value) in &self.selector {
            if key.is_empty() {
                return Err(ModelError::InvalidFieldValue {
                    field: "selector".to_string(),
                    message: "empty label key".to_string(),
                });
            }
            if value.is_empty() {
                return Err(ModelError::InvalidFieldValue {
                    field: format!("selector.{}", key),
                    message: "empty label value".to_string(),
                });
            }
        }

        if let Some(mac) = self.selector.get(MAC_LABEL) {
            MacAddr::parse(mac)?;
        }

        Ok(())
    }

    /// Validate and rewrite the `mac` selector in the lower-case colon form
    /// request labels are normalized to
    pub fn normalized(mut self) -> Result<Self> {
        self.validate()?;
        if let Some(mac) = self.selector.get_mut(MAC_LABEL) {
            *mac = MacAddr::parse(mac)?.to_string();
        }
        Ok(self)
    }

    /// Parse and validate a Group from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let group: Group = serde_json::from_str(json)?;
        group.validate()?;
        Ok(group)
    }
}

/// Order by descending specificity, then ascending id.
pub fn by_specificity(a: &Group, b: &Group) -> Ordering {
    b.specificity()
        .cmp(&a.specificity())
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort groups into evaluation order for selection
pub fn sort_by_specificity(groups: &mut [Group]) {
    groups.sort_by(by_specificity);
}
