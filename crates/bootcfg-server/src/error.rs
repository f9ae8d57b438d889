//! Error types for the bootcfg core
//!
//! Every failure is classified by `ErrorKind`; the HTTP boundary only looks
//! at the kind, so failure detail never reaches the client.

use crate::render::RenderError;
use crate::store::StoreError;
use bootcfg_ignition::IgnitionError;
use bootcfg_ipxe::IpxeError;
use bootcfg_metadata::MetadataError;
use bootcfg_model::{Labels, ModelError, TemplateNamespace};
use thiserror::Error;

/// Failure classes surfaced at the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No matching Group, Profile or template content
    NotFound,
    /// A stored record fails structural validation
    Invalid,
    /// Template parse or evaluation failure
    Render,
    /// Rendered output fails its format check
    Validation,
    /// The request itself is unusable
    MalformedRequest,
    /// Store I/O or response encoding failure
    Internal,
}

/// Error type for core operations
#[derive(Debug, Error)]
pub enum BootcfgError {
    #[error("no group matches labels {0:?}")]
    NoMatchingGroup(Labels),

    #[error("group {group} has no usable profile: {reason}")]
    NoMatchingProfile { group: String, reason: String },

    #[error("profile {profile} names no {namespace} template")]
    MissingTemplateRef {
        profile: String,
        namespace: TemplateNamespace,
    },

    #[error("invalid group {id}: {source}")]
    InvalidGroup {
        id: String,
        #[source]
        source: ModelError,
    },

    #[error("invalid profile {id}: {source}")]
    InvalidProfile {
        id: String,
        #[source]
        source: ModelError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("invalid boot payload: {0}")]
    Ipxe(#[from] IpxeError),

    #[error("invalid ignition config: {0}")]
    Ignition(#[from] IgnitionError),

    #[error("invalid metadata: {0}")]
    Metadata(#[from] MetadataError),

    /// Body is the raw request path
    #[error("invalid MAC address {0}")]
    InvalidMac(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BootcfgError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BootcfgError::NoMatchingGroup(_)
            | BootcfgError::NoMatchingProfile { .. }
            | BootcfgError::MissingTemplateRef { .. } => ErrorKind::NotFound,
            BootcfgError::InvalidGroup { .. } | BootcfgError::InvalidProfile { .. } => {
                ErrorKind::Invalid
            }
            BootcfgError::Store(e) if e.is_not_found() => ErrorKind::NotFound,
            BootcfgError::Store(_) => ErrorKind::Internal,
            BootcfgError::Render(_) => ErrorKind::Render,
            BootcfgError::Ipxe(IpxeError::Serialization(_)) => ErrorKind::Internal,
            BootcfgError::Ipxe(_)
            | BootcfgError::Ignition(_)
            | BootcfgError::Metadata(_) => ErrorKind::Validation,
            BootcfgError::InvalidMac(_) => ErrorKind::MalformedRequest,
            BootcfgError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, BootcfgError>;
