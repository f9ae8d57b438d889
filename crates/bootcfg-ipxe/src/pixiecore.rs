//! Pixiecore API boot documents
//!
//! Pixiecore in API mode asks `GET /pixiecore/v1/boot/<mac>` and expects
//! a JSON document naming the kernel, initrds and kernel arguments. Unlike
//! the iPXE script, arguments stay a mapping.

use crate::error::{IpxeError, Result};
use bootcfg_model::{Boot, Profile};
use serde::Serialize;
use std::collections::BTreeMap;

/// Boot document served to Pixiecore
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PixiecoreBoot<'a> {
    pub kernel: &'a str,
    pub initrd: &'a [String],
    pub cmdline: &'a BTreeMap<String, String>,
}

impl<'a> PixiecoreBoot<'a> {
    /// Borrow a validated boot document from boot parameters
    pub fn from_boot(boot: &'a Boot) -> Result<Self> {
        boot.validate()?;
        Ok(Self {
            kernel: &boot.kernel,
            initrd: &boot.initrd,
            cmdline: &boot.cmdline,
        })
    }
}

/// Encode a Profile's boot parameters as Pixiecore JSON
pub fn pixiecore_json(profile: &Profile) -> Result<String> {
    let boot = profile
        .boot
        .as_ref()
        .ok_or_else(|| IpxeError::MissingBoot(profile.id.clone()))?;
    Ok(serde_json::to_string(&PixiecoreBoot::from_boot(boot)?)?)
}
