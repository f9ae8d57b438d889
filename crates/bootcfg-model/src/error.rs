//! Error types for model validation

use thiserror::Error;

/// Errors that can occur when validating or parsing model resources
#[derive(Debug, Error)]
pub enum ModelError {
    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Invalid field value
    #[error("invalid value for field '{field}': {message}")]
    InvalidFieldValue { field: String, message: String },

    /// Invalid MAC address format
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    /// Metadata contained a value with no typed representation
    #[error("unsupported metadata value: {0}")]
    UnsupportedMetadata(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
