//! bootcfg metadata and user-data payloads
//!
//! # Flat metadata
//!
//! Group metadata flattened to `KEY=value` lines, the format consumed by
//! shell scripts and systemd `EnvironmentFile=` units on first boot.
//!
//! ```
//! use bootcfg_metadata::FlatMetadata;
//! use bootcfg_model::Metadata;
//!
//! let mut doc = Metadata::new();
//! doc.insert("service_name".to_string(), "etcd2".into());
//!
//! let flat = FlatMetadata::from_document(&doc)
//!     .unwrap()
//!     .with_identifier("uuid", "a1b2c3d4")
//!     .unwrap();
//! assert_eq!(flat.render(), "SERVICE_NAME=etcd2\nUUID=a1b2c3d4\n");
//! ```
//!
//! # User-data
//!
//! Rendered Cloud-Config templates must either carry the `#cloud-config`
//! header (and parse as a cloud-config document) or be a `#!` script.

pub mod cloud_config;
pub mod error;
pub mod flat;
pub mod user_data;

pub use cloud_config::CloudConfig;
pub use error::{MetadataError, Result};
pub use flat::FlatMetadata;
pub use user_data::UserData;
