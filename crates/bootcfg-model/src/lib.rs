//! bootcfg data model
//!
//! Types shared by the selection engine, the template renderer and the
//! protocol encoders.
//!
//! # Resources
//!
//! - `Group` - matches machines by label selector and carries metadata
//! - `Profile` - boot parameters plus references to named templates
//! - `MetadataValue` - typed structured metadata attached to a Group
//! - `MacAddr` - hardware address parsed from requests
//!
//! All relations between resources are by id and resolved at request time.

pub mod error;
pub mod group;
pub mod mac;
pub mod metadata;
pub mod profile;

pub use error::*;
pub use group::*;
pub use mac::*;
pub use metadata::*;
pub use profile::*;

/// Label key under which a machine's MAC address is matched
pub const MAC_LABEL: &str = "mac";

/// Label key carrying the machine UUID
pub const UUID_LABEL: &str = "uuid";
