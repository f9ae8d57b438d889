//! User-data classification
//!
//! Rendered Cloud-Config templates are served as user-data. Only two shapes
//! are accepted: a `#cloud-config` document, which must also parse, or an
//! executable script starting with `#!`.

use crate::cloud_config::CloudConfig;
use crate::error::{MetadataError, Result};
use tracing::debug;

/// Header line identifying a cloud-config document
pub const CLOUD_CONFIG_HEADER: &str = "#cloud-config";

/// Validated user-data
#[derive(Debug, Clone, PartialEq)]
pub enum UserData {
    /// Cloud-config YAML
    CloudConfig(String),

    /// Executable script
    Script(String),
}

impl UserData {
    /// Classify and validate rendered user-data
    pub fn parse(content: String) -> Result<Self> {
        if is_cloud_config(&content) {
            let config = CloudConfig::parse(&content)?;
            debug!(
                units = config.coreos.units.len(),
                write_files = config.write_files.len(),
                "parsed cloud-config"
            );
            Ok(UserData::CloudConfig(content))
        } else if is_script(&content) {
            Ok(UserData::Script(content))
        } else {
            Err(MetadataError::UnrecognizedUserData)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            UserData::CloudConfig(s) | UserData::Script(s) => s,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            UserData::CloudConfig(s) | UserData::Script(s) => s,
        }
    }
}

/// Whether the first line is exactly the cloud-config header
pub fn is_cloud_config(content: &str) -> bool {
    let header = content.split('\n').next().unwrap_or_default();
    header.trim_end_matches('\r') == CLOUD_CONFIG_HEADER
}

/// Whether the content starts with a `#!` interpreter line
pub fn is_script(content: &str) -> bool {
    content.starts_with("#!")
}
