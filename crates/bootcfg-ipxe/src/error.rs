//! Error types for boot payload generation

use thiserror::Error;

/// Error type for iPXE and Pixiecore operations
#[derive(Debug, Error)]
pub enum IpxeError {
    /// Profile has no boot parameters
    #[error("profile {0} has no boot parameters")]
    MissingBoot(String),

    /// Boot parameters are structurally invalid
    #[error("invalid boot parameters: {0}")]
    InvalidBoot(#[from] bootcfg_model::ModelError),

    /// JSON encoding failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for iPXE operations
pub type Result<T> = std::result::Result<T, IpxeError>;
