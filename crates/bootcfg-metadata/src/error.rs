//! Error types for metadata and user-data payloads

use thiserror::Error;

/// Error type for metadata operations
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Two fields map to the same output key
    #[error("metadata key collision: {0}")]
    KeyCollision(String),

    /// A value cannot be written on a single line
    #[error("invalid metadata value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// User-data is neither a cloud-config nor a script
    #[error("user-data is neither a cloud-config document nor a script")]
    UnrecognizedUserData,

    /// Cloud-config failed to parse
    #[error("invalid cloud-config: {0}")]
    CloudConfig(#[from] serde_yaml::Error),

    /// Cloud-config parsed but is structurally invalid
    #[error("invalid cloud-config: {0}")]
    InvalidCloudConfig(String),
}

/// Result type for metadata operations
pub type Result<T> = std::result::Result<T, MetadataError>;
