//! Error types for Ignition configs

use thiserror::Error;

/// Error type for Ignition parsing and serialization
#[derive(Debug, Error)]
pub enum IgnitionError {
    /// Rendered text is neither JSON nor YAML
    #[error("config is neither JSON ({json}) nor YAML ({yaml})")]
    Parse { json: String, yaml: String },

    /// Top level of the document is not an object
    #[error("config must be an object")]
    NotAnObject,

    /// JSON config carries no version field
    #[error("config has no ignition version")]
    MissingVersion,

    /// Version field is present but not one this encoder emits
    #[error("unsupported ignition version: {0}")]
    UnsupportedVersion(String),

    /// Version string is not semver
    #[error("invalid ignition version: {0}")]
    InvalidVersion(#[from] semver::Error),

    /// Config parsed but fails a structural check
    #[error("invalid ignition config: {0}")]
    Invalid(String),

    /// Config body has the wrong shape
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for Ignition operations
pub type Result<T> = std::result::Result<T, IgnitionError>;
