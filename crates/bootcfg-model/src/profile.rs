//! Profiles
//!
//! A Profile names the boot parameters for a class of machines and refers
//! to at most one template per namespace. Template references are checked
//! lazily, when a payload is rendered.

use crate::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Template namespaces held by the store. Names in different namespaces
/// never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateNamespace {
    /// Ignition configs (also the source of `include`d templates)
    Ignition,
    /// Cloud-Config user-data
    Cloud,
    /// Generic templates with no format check
    Generic,
}

impl TemplateNamespace {
    pub const ALL: [TemplateNamespace; 3] = [
        TemplateNamespace::Ignition,
        TemplateNamespace::Cloud,
        TemplateNamespace::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateNamespace::Ignition => "ignition",
            TemplateNamespace::Cloud => "cloud",
            TemplateNamespace::Generic => "generic",
        }
    }
}

impl fmt::Display for TemplateNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network boot parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Boot {
    /// Kernel image path or URL
    pub kernel: String,

    /// Initrd paths or URLs, in load order
    #[serde(default)]
    pub initrd: Vec<String>,

    /// Kernel arguments; an empty value is a bare flag
    #[serde(default)]
    pub cmdline: BTreeMap<String, String>,
}

impl Boot {
    /// Create boot parameters for a kernel
    pub fn new(kernel: impl Into<String>) -> Self {
        Self {
            kernel: kernel.into(),
            ..Default::default()
        }
    }

    /// Append an initrd
    pub fn with_initrd(mut self, initrd: impl Into<String>) -> Self {
        self.initrd.push(initrd.into());
        self
    }

    /// Add a kernel argument (empty value for a bare flag)
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cmdline.insert(key.into(), value.into());
        self
    }

    /// Validate the boot parameters
    pub fn validate(&self) -> Result<()> {
        if self.kernel.trim().is_empty() {
            return Err(ModelError::MissingField("boot.kernel".to_string()));
        }

        for (i, initrd) in self.initrd.iter().enumerate() {
            if initrd.trim().is_empty() {
                return Err(ModelError::InvalidFieldValue {
                    field: format!("boot.initrd[{}]", i),
                    message: "empty path".to_string(),
                });
            }
        }

        for key in self.cmdline.keys() {
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(ModelError::InvalidFieldValue {
                    field: "boot.cmdline".to_string(),
                    message: format!("invalid argument name {:?}", key),
                });
            }
        }

        Ok(())
    }
}

/// Profile resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Profile {
    /// Unique identifier
    pub id: String,

    /// Human readable name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Network boot parameters (required for iPXE and Pixiecore)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot: Option<Boot>,

    /// Ignition template name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignition_id: Option<String>,

    /// Cloud-Config template name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_id: Option<String>,

    /// Generic template name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_id: Option<String>,
}

impl Profile {
    /// Create a new, empty Profile
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set boot parameters
    pub fn with_boot(mut self, boot: Boot) -> Self {
        self.boot = Some(boot);
        self
    }

    /// Set the Ignition template name
    pub fn with_ignition(mut self, name: impl Into<String>) -> Self {
        self.ignition_id = Some(name.into());
        self
    }

    /// Set the Cloud-Config template name
    pub fn with_cloud(mut self, name: impl Into<String>) -> Self {
        self.cloud_id = Some(name.into());
        self
    }

    /// Set the generic template name
    pub fn with_generic(mut self, name: impl Into<String>) -> Self {
        self.generic_id = Some(name.into());
        self
    }

    /// Template name referenced for a namespace. Empty names count as unset.
    pub fn template_ref(&self, namespace: TemplateNamespace) -> Option<&str> {
        let name = match namespace {
            TemplateNamespace::Ignition => self.ignition_id.as_deref(),
            TemplateNamespace::Cloud => self.cloud_id.as_deref(),
            TemplateNamespace::Generic => self.generic_id.as_deref(),
        };
        name.filter(|n| !n.is_empty())
    }

    /// Validate the stored record. Boot parameters are checked by the
    /// encoders that need them.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(ModelError::MissingField("id".to_string()));
        }
        Ok(())
    }

    /// Parse and validate a Profile from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let profile: Profile = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }
}
