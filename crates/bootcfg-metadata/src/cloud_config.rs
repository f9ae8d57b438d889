//! Cloud-config document model
//!
//! Covers the keys coreos-cloudinit acts on. Unknown keys are tolerated,
//! but known keys with the wrong shape fail the parse. Dashed key spellings
//! (`ssh-authorized-keys`) are accepted alongside underscored ones.

use crate::error::{MetadataError, Result};
use serde::Deserialize;

/// Systemd unit commands cloud-init may issue
const UNIT_COMMANDS: &[&str] = &[
    "start",
    "stop",
    "restart",
    "reload",
    "try-restart",
    "reload-or-restart",
    "reload-or-try-restart",
];

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CloudConfig {
    #[serde(alias = "ssh-authorized-keys")]
    pub ssh_authorized_keys: Vec<String>,

    pub coreos: CoreOs,

    #[serde(alias = "write-files")]
    pub write_files: Vec<WriteFile>,

    pub hostname: Option<String>,

    pub users: Vec<User>,

    #[serde(alias = "manage-etc-hosts")]
    pub manage_etc_hosts: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoreOs {
    pub etcd: Option<serde_yaml::Mapping>,
    pub etcd2: Option<serde_yaml::Mapping>,
    pub flannel: Option<serde_yaml::Mapping>,
    pub fleet: Option<serde_yaml::Mapping>,
    pub locksmith: Option<serde_yaml::Mapping>,
    pub update: Option<Update>,
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Update {
    #[serde(alias = "reboot-strategy")]
    pub reboot_strategy: Option<String>,
    pub group: Option<String>,
    pub server: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Unit {
    pub name: String,
    #[serde(default)]
    pub mask: bool,
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub runtime: bool,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default, alias = "drop-ins")]
    pub drop_ins: Vec<DropIn>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DropIn {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WriteFile {
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub permissions: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub passwd: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default, alias = "ssh-authorized-keys")]
    pub ssh_authorized_keys: Vec<String>,
    #[serde(default)]
    pub shell: Option<String>,
}

impl CloudConfig {
    /// Parse a cloud-config document (header included) and check it
    pub fn parse(content: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        let config = match value {
            serde_yaml::Value::Null => CloudConfig::default(),
            serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value)?,
            _ => {
                return Err(MetadataError::InvalidCloudConfig(
                    "document is not a mapping".to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for unit in &self.coreos.units {
            if unit.name.trim().is_empty() {
                return Err(MetadataError::InvalidCloudConfig(
                    "unit without a name".to_string(),
                ));
            }
            if let Some(command) = &unit.command {
                if !UNIT_COMMANDS.contains(&command.as_str()) {
                    return Err(MetadataError::InvalidCloudConfig(format!(
                        "unit {}: unknown command {:?}",
                        unit.name, command
                    )));
                }
            }
            if unit.drop_ins.iter().any(|d| d.name.trim().is_empty()) {
                return Err(MetadataError::InvalidCloudConfig(format!(
                    "unit {}: drop-in without a name",
                    unit.name
                )));
            }
        }

        if self.write_files.iter().any(|f| f.path.trim().is_empty()) {
            return Err(MetadataError::InvalidCloudConfig(
                "write_files entry without a path".to_string(),
            ));
        }

        if self.users.iter().any(|u| u.name.trim().is_empty()) {
            return Err(MetadataError::InvalidCloudConfig(
                "user without a name".to_string(),
            ));
        }

        Ok(())
    }
}
