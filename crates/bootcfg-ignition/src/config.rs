//! Ignition config model
//!
//! The body (storage, systemd, networkd, passwd) is shared by both
//! envelope versions; only the version marker differs on the wire.
//!
//! ```text
//! v1: {"ignitionVersion":1,"storage":{},...}
//! v2: {"ignition":{"version":"2.0.0","config":{}},"storage":{},...}
//! ```

use crate::error::{IgnitionError, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Envelope version of an Ignition config
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnitionVersion {
    /// Legacy integer `ignitionVersion: 1`
    V1,
    /// `ignition.version` semver string with major version 2
    V2(Version),
}

impl IgnitionVersion {
    /// Version assumed for YAML configs that do not name one
    pub fn default_v2() -> Self {
        IgnitionVersion::V2(Version::new(2, 0, 0))
    }

    /// Parse an `ignition.version` string
    pub fn parse_v2(version: &str) -> Result<Self> {
        let parsed = Version::parse(version)?;
        if parsed.major != 2 {
            return Err(IgnitionError::UnsupportedVersion(version.to_string()));
        }
        Ok(IgnitionVersion::V2(parsed))
    }
}

impl fmt::Display for IgnitionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnitionVersion::V1 => write!(f, "1"),
            IgnitionVersion::V2(v) => write!(f, "{}", v),
        }
    }
}

/// Config body shared by both envelope versions
///
/// Fields not modelled here are carried in each section's `extra` map and
/// written back unchanged, so later 2.x keys (`overwrite`, `enabled`, ...)
/// survive the round trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub storage: Storage,
    pub systemd: Systemd,
    pub networkd: Networkd,
    pub passwd: Passwd,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Storage {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disks: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub raid: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filesystems: Vec<Filesystem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<File>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A filesystem entry
///
/// v2 names filesystems and lists files separately (`name`, `mount`,
/// `path`); v1 identifies them by `device` and nests their `files`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Filesystem {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<File>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct File {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filesystem: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<FileContents>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// File body: inline text (v1) or a source URL (v2)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FileContents {
    Inline(String),
    Source(FileSource),
}

/// Only gzip is understood by the agent
pub const SUPPORTED_COMPRESSION: &[&str] = &["", "gzip"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileSource {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Systemd {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<SystemdUnit>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SystemdUnit {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub enable: bool,
    /// 2.1+ spelling of `enable`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub mask: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contents: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropins: Vec<Dropin>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dropin {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contents: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Networkd {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<NetworkdUnit>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkdUnit {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contents: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Passwd {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<User>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub name: String,
    #[serde(
        default,
        rename = "passwordHash",
        alias = "password_hash",
        skip_serializing_if = "Option::is_none"
    )]
    pub password_hash: Option<String>,
    #[serde(
        default,
        rename = "sshAuthorizedKeys",
        alias = "ssh_authorized_keys",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ssh_authorized_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
    #[serde(
        default,
        rename = "passwordHash",
        alias = "password_hash",
        skip_serializing_if = "Option::is_none"
    )]
    pub password_hash: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn invalid(message: impl Into<String>) -> IgnitionError {
    IgnitionError::Invalid(message.into())
}

impl Config {
    /// Structural checks the Ignition agent would otherwise fail on at
    /// boot, for the body shape of `version`
    pub fn validate(&self, version: &IgnitionVersion) -> Result<()> {
        for unit in &self.systemd.units {
            if unit.name.trim().is_empty() {
                return Err(invalid("systemd unit without a name"));
            }
            if unit.dropins.iter().any(|d| d.name.trim().is_empty()) {
                return Err(invalid(format!(
                    "systemd unit {}: dropin without a name",
                    unit.name
                )));
            }
        }
        if self.networkd.units.iter().any(|u| u.name.trim().is_empty()) {
            return Err(invalid("networkd unit without a name"));
        }
        if self.passwd.users.iter().any(|u| u.name.trim().is_empty()) {
            return Err(invalid("user without a name"));
        }
        if self.passwd.groups.iter().any(|g| g.name.trim().is_empty()) {
            return Err(invalid("group without a name"));
        }

        match version {
            IgnitionVersion::V1 => self.validate_v1_storage(),
            IgnitionVersion::V2(_) => self.validate_v2_storage(),
        }
    }

    fn validate_v1_storage(&self) -> Result<()> {
        if !self.storage.files.is_empty() {
            return Err(invalid("version 1 files must be nested under a filesystem"));
        }
        for fs in &self.storage.filesystems {
            if fs.device.as_deref().map_or(true, |d| d.trim().is_empty()) {
                return Err(invalid("version 1 filesystem without a device"));
            }
            for file in &fs.files {
                validate_file(file)?;
                if matches!(file.contents, Some(FileContents::Source(_))) {
                    return Err(invalid(format!(
                        "{}: version 1 file contents must be inline text",
                        file.path
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_v2_storage(&self) -> Result<()> {
        for fs in &self.storage.filesystems {
            if fs.name.trim().is_empty() {
                return Err(invalid("filesystem without a name"));
            }
            if !fs.files.is_empty() {
                return Err(invalid(format!(
                    "filesystem {}: files belong in storage.files",
                    fs.name
                )));
            }
        }
        for file in &self.storage.files {
            validate_file(file)?;
            if file.filesystem.trim().is_empty() {
                return Err(invalid(format!("{}: file without a filesystem", file.path)));
            }
            match &file.contents {
                Some(FileContents::Inline(_)) => {
                    return Err(invalid(format!(
                        "{}: file contents must be an object with a source",
                        file.path
                    )))
                }
                Some(FileContents::Source(source)) => {
                    let compression = source.compression.as_deref().unwrap_or_default();
                    if !SUPPORTED_COMPRESSION.contains(&compression) {
                        return Err(invalid(format!(
                            "{}: unsupported compression {:?}",
                            file.path, compression
                        )));
                    }
                }
                None => {}
            }
        }
        Ok(())
    }
}

fn validate_file(file: &File) -> Result<()> {
    if !file.path.starts_with('/') {
        return Err(invalid(format!("file path must be absolute: {:?}", file.path)));
    }
    Ok(())
}

/// A parsed Ignition config with its envelope version
#[derive(Debug, Clone, PartialEq)]
pub struct IgnitionConfig {
    pub version: IgnitionVersion,

    /// `ignition.config` references (v2 only)
    pub references: Map<String, Value>,

    /// Other keys of the v2 `ignition` section (`timeouts`, `security`)
    pub section: Map<String, Value>,

    pub config: Config,
}

#[derive(Serialize)]
struct V1Envelope<'a> {
    #[serde(rename = "ignitionVersion")]
    ignition_version: u8,
    #[serde(flatten)]
    config: &'a Config,
}

#[derive(Serialize)]
struct V2Section<'a> {
    version: &'a Version,
    config: &'a Map<String, Value>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

#[derive(Serialize)]
struct V2Envelope<'a> {
    ignition: V2Section<'a>,
    #[serde(flatten)]
    config: &'a Config,
}

impl IgnitionConfig {
    pub fn new(version: IgnitionVersion, config: Config) -> Self {
        Self {
            version,
            references: Map::new(),
            section: Map::new(),
            config,
        }
    }

    /// Re-tag the config with another envelope version
    pub fn with_version(mut self, version: IgnitionVersion) -> Self {
        self.version = version;
        self
    }

    /// Check the body against the config's own envelope version
    pub fn validate(&self) -> Result<()> {
        if self.version == IgnitionVersion::V1
            && !(self.references.is_empty() && self.section.is_empty())
        {
            return Err(invalid("ignition section cannot be expressed in version 1"));
        }
        self.config.validate(&self.version)
    }

    /// Serialize using the config's own envelope version
    ///
    /// Fails if the body does not fit that version, so a config re-tagged
    /// with `with_version` is never written in a shape its agent rejects.
    pub fn to_json(&self) -> Result<String> {
        self.validate()?;
        let json = match &self.version {
            IgnitionVersion::V1 => {
                serde_json::to_string(&V1Envelope {
                    ignition_version: 1,
                    config: &self.config,
                })?
            }
            IgnitionVersion::V2(version) => serde_json::to_string(&V2Envelope {
                ignition: V2Section {
                    version,
                    config: &self.references,
                    extra: &self.section,
                },
                config: &self.config,
            })?,
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str) -> SystemdUnit {
        SystemdUnit {
            name: name.to_string(),
            enable: true,
            ..SystemdUnit::default()
        }
    }

    fn units_config() -> Config {
        Config {
            systemd: Systemd {
                units: vec![unit("etcd2.service"), unit("a1b2c3d4.service")],
                ..Systemd::default()
            },
            ..Config::default()
        }
    }

    fn v1_filesystem() -> Filesystem {
        Filesystem {
            device: Some("/dev/disk/by-label/ROOT".to_string()),
            format: Some("ext4".to_string()),
            files: vec![File {
                path: "/etc/hostname".to_string(),
                contents: Some(FileContents::Inline("node1".to_string())),
                ..File::default()
            }],
            ..Filesystem::default()
        }
    }

    #[test]
    fn test_both_envelopes_from_one_config() {
        let v2 = IgnitionConfig::new(IgnitionVersion::default_v2(), units_config());
        assert_eq!(
            v2.to_json().unwrap(),
            r#"{"ignition":{"version":"2.0.0","config":{}},"storage":{},"systemd":{"units":[{"name":"etcd2.service","enable":true},{"name":"a1b2c3d4.service","enable":true}]},"networkd":{},"passwd":{}}"#
        );

        let v1 = v2.with_version(IgnitionVersion::V1);
        assert_eq!(
            v1.to_json().unwrap(),
            r#"{"ignitionVersion":1,"storage":{},"systemd":{"units":[{"name":"etcd2.service","enable":true},{"name":"a1b2c3d4.service","enable":true}]},"networkd":{},"passwd":{}}"#
        );
    }

    #[test]
    fn test_parse_v2_version() {
        assert_eq!(
            IgnitionVersion::parse_v2("2.1.0").unwrap().to_string(),
            "2.1.0"
        );
        assert!(matches!(
            IgnitionVersion::parse_v2("3.0.0"),
            Err(IgnitionError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            IgnitionVersion::parse_v2("two"),
            Err(IgnitionError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_ignition_section_not_representable_in_v1() {
        let mut config = IgnitionConfig::new(IgnitionVersion::V1, Config::default());
        config
            .references
            .insert("append".to_string(), Value::Array(vec![]));
        assert!(matches!(config.to_json(), Err(IgnitionError::Invalid(_))));

        let mut config = IgnitionConfig::new(IgnitionVersion::V1, Config::default());
        config
            .section
            .insert("timeouts".to_string(), serde_json::json!({"httpTotal": 30}));
        assert!(matches!(config.to_json(), Err(IgnitionError::Invalid(_))));
    }

    #[test]
    fn test_v1_storage_serializes() {
        let mut config = Config::default();
        config.storage.filesystems.push(v1_filesystem());
        let v1 = IgnitionConfig::new(IgnitionVersion::V1, config);
        assert_eq!(
            v1.to_json().unwrap(),
            r#"{"ignitionVersion":1,"storage":{"filesystems":[{"device":"/dev/disk/by-label/ROOT","format":"ext4","files":[{"path":"/etc/hostname","contents":"node1"}]}]},"systemd":{},"networkd":{},"passwd":{}}"#
        );

        // The nested v1 shape is not a valid v2 body
        let v2 = v1.with_version(IgnitionVersion::default_v2());
        assert!(matches!(v2.to_json(), Err(IgnitionError::Invalid(_))));
    }

    #[test]
    fn test_extra_fields_written_back() {
        let mut config = units_config();
        config.systemd.units[0]
            .extra
            .insert("unknown".to_string(), Value::Bool(true));
        config
            .extra
            .insert("vendor".to_string(), serde_json::json!({"k": "v"}));

        let json = IgnitionConfig::new(IgnitionVersion::default_v2(), config)
            .to_json()
            .unwrap();
        assert!(json.contains(r#"{"name":"etcd2.service","enable":true,"unknown":true}"#));
        assert!(json.ends_with(r#""passwd":{},"vendor":{"k":"v"}}"#));
    }

    #[test]
    fn test_validate() {
        let v2 = IgnitionVersion::default_v2();
        let mut config = units_config();
        assert!(config.validate(&v2).is_ok());

        config.systemd.units[0].name = String::new();
        assert!(config.validate(&v2).is_err());

        let relative = File {
            filesystem: "root".to_string(),
            path: "etc/hostname".to_string(),
            mode: Some(0o644),
            ..File::default()
        };
        let mut config = Config::default();
        config.storage.files.push(relative);
        assert!(config.validate(&v2).is_err());
    }

    #[test]
    fn test_validate_v2_storage() {
        let v2 = IgnitionVersion::default_v2();
        let file = |contents: FileContents| File {
            filesystem: "root".to_string(),
            path: "/etc/motd".to_string(),
            contents: Some(contents),
            ..File::default()
        };
        let gzip = |compression: &str| {
            FileContents::Source(FileSource {
                source: "data:;base64,H4sI".to_string(),
                compression: Some(compression.to_string()),
                ..FileSource::default()
            })
        };

        let mut config = Config::default();
        config.storage.files.push(file(gzip("gzip")));
        assert!(config.validate(&v2).is_ok());

        config.storage.files[0] = file(gzip("bzip2"));
        assert!(config.validate(&v2).is_err());

        config.storage.files[0] = file(FileContents::Inline("hello".to_string()));
        assert!(config.validate(&v2).is_err());

        let mut config = Config::default();
        config.storage.filesystems.push(Filesystem::default());
        assert!(config.validate(&v2).is_err());
    }

    #[test]
    fn test_validate_v1_storage() {
        let mut config = Config::default();
        config.storage.filesystems.push(v1_filesystem());
        assert!(config.validate(&IgnitionVersion::V1).is_ok());

        config.storage.filesystems[0].device = None;
        assert!(config.validate(&IgnitionVersion::V1).is_err());

        let mut config = Config::default();
        config.storage.files.push(File {
            path: "/etc/motd".to_string(),
            ..File::default()
        });
        assert!(config.validate(&IgnitionVersion::V1).is_err());
    }
}
