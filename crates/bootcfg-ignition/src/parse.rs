//! Rendered template to Ignition config
//!
//! Text is tried as JSON first and as YAML second. JSON configs must name
//! their version; YAML configs default to 2.0.0.

use crate::config::{Config, IgnitionConfig, IgnitionVersion};
use crate::error::{IgnitionError, Result};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Json,
    Yaml,
}

/// Parse and validate rendered Ignition text
pub fn parse(text: &str) -> Result<IgnitionConfig> {
    let (value, dialect) = match serde_json::from_str::<Value>(text) {
        Ok(value) => (value, Dialect::Json),
        Err(json_err) => {
            let value = serde_yaml::from_str::<Value>(text).map_err(|yaml_err| {
                IgnitionError::Parse {
                    json: json_err.to_string(),
                    yaml: yaml_err.to_string(),
                }
            })?;
            (value, Dialect::Yaml)
        }
    };

    let Value::Object(mut object) = value else {
        return Err(IgnitionError::NotAnObject);
    };

    let (version, section) = take_version(&mut object, dialect)?;
    let config: Config = serde_json::from_value(Value::Object(object))?;

    let parsed = IgnitionConfig {
        version,
        references: section.references,
        section: section.extra,
        config,
    };
    parsed.validate()?;

    debug!(?dialect, version = %parsed.version, "parsed ignition config");
    Ok(parsed)
}

/// `ignition` section keys other than `version`
#[derive(Debug, Default)]
struct Section {
    references: Map<String, Value>,
    extra: Map<String, Value>,
}

/// Remove the version markers from the top-level object
fn take_version(
    object: &mut Map<String, Value>,
    dialect: Dialect,
) -> Result<(IgnitionVersion, Section)> {
    let legacy = object.remove("ignitionVersion");
    let legacy_yaml = object.remove("ignition_version");
    let section = object.remove("ignition");

    let legacy = match (legacy, dialect) {
        (Some(v), _) => Some(v),
        (None, Dialect::Yaml) => legacy_yaml,
        (None, Dialect::Json) => {
            if let Some(v) = legacy_yaml {
                return Err(IgnitionError::UnsupportedVersion(v.to_string()));
            }
            None
        }
    };

    match (legacy, section) {
        (Some(_), Some(_)) => Err(IgnitionError::Invalid(
            "config names both a legacy and a semver version".to_string(),
        )),
        (Some(v), None) => {
            if v.as_u64() == Some(1) {
                Ok((IgnitionVersion::V1, Section::default()))
            } else {
                Err(IgnitionError::UnsupportedVersion(v.to_string()))
            }
        }
        (None, Some(section)) => v2_section(section),
        (None, None) => match dialect {
            Dialect::Yaml => Ok((IgnitionVersion::default_v2(), Section::default())),
            Dialect::Json => Err(IgnitionError::MissingVersion),
        },
    }
}

fn v2_section(section: Value) -> Result<(IgnitionVersion, Section)> {
    let Value::Object(mut section) = section else {
        return Err(IgnitionError::Invalid("ignition section must be an object".to_string()));
    };

    let version = match section.remove("version") {
        Some(Value::String(v)) => IgnitionVersion::parse_v2(&v)?,
        Some(other) => return Err(IgnitionError::UnsupportedVersion(other.to_string())),
        None => return Err(IgnitionError::MissingVersion),
    };

    let references = match section.remove("config") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(refs)) => refs,
        Some(_) => {
            return Err(IgnitionError::Invalid(
                "ignition.config must be an object".to_string(),
            ))
        }
    };

    // timeouts, security and later 2.x keys pass through unchanged
    Ok((
        version,
        Section {
            references,
            extra: section,
        },
    ))
}
