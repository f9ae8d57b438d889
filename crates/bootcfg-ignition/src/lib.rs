//! bootcfg Ignition configs
//!
//! Rendered Ignition templates may be written as JSON or as YAML. Either
//! way the result is parsed into a typed config, checked, and served as
//! JSON in the envelope the config declares.
//!
//! # Versions
//!
//! - **v1**: top-level integer `ignitionVersion: 1`
//! - **v2**: `ignition.version` semver string (major 2) with a nested
//!   `ignition.config` object
//!
//! v1 nests files under a device-named filesystem with inline contents;
//! v2 names filesystems and lists files with a `source`. The body is
//! checked against the shape of its declared version. Keys the model does
//! not name, including later 2.x additions such as `ignition.timeouts`,
//! are carried through to the served JSON unchanged.
//!
//! # Example
//!
//! ```
//! use bootcfg_ignition::parse;
//!
//! let config = parse("systemd:\n  units:\n    - name: etcd2.service\n      enable: true\n").unwrap();
//! assert!(config.to_json().unwrap().starts_with(r#"{"ignition":{"version":"2.0.0""#));
//! ```

pub mod config;
pub mod error;
pub mod parse;

pub use config::{Config, IgnitionConfig, IgnitionVersion};
pub use error::{IgnitionError, Result};
pub use parse::parse;
