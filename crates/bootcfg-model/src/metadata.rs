//! Typed Group metadata
//!
//! Metadata is an arbitrary structured document attached to a Group. It is
//! stored as JSON but held as a tagged variant so formatting rules are
//! exhaustive. JSON `null` has no representation and is rejected on load.

use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Structured metadata document (top-level field name -> value)
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A single metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub enum MetadataValue {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    List(Vec<MetadataValue>),
    Map(BTreeMap<String, MetadataValue>),
}

impl MetadataValue {
    /// Borrow the string payload, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl TryFrom<serde_json::Value> for MetadataValue {
    type Error = ModelError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        Ok(match value {
            Value::String(s) => MetadataValue::String(s),
            Value::Number(n) => MetadataValue::Number(n),
            Value::Bool(b) => MetadataValue::Bool(b),
            Value::Array(items) => MetadataValue::List(
                items
                    .into_iter()
                    .map(MetadataValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(fields) => MetadataValue::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| MetadataValue::try_from(v).map(|v| (k, v)))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Null => return Err(ModelError::UnsupportedMetadata("null".to_string())),
        })
    }
}

impl From<MetadataValue> for serde_json::Value {
    fn from(value: MetadataValue) -> Self {
        match value {
            MetadataValue::String(s) => serde_json::Value::String(s),
            MetadataValue::Number(n) => serde_json::Value::Number(n),
            MetadataValue::Bool(b) => serde_json::Value::Bool(b),
            MetadataValue::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            MetadataValue::Map(fields) => serde_json::Value::Object(
                fields.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self {
        MetadataValue::Number(n.into())
    }
}

impl From<u64> for MetadataValue {
    fn from(n: u64) -> Self {
        MetadataValue::Number(n.into())
    }
}

impl<T: Into<MetadataValue>> From<Vec<T>> for MetadataValue {
    fn from(items: Vec<T>) -> Self {
        MetadataValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Scalar-sequence text form used by flat metadata output.
///
/// Lists render as `[a b]`, maps as `map[k:v k2:v2]` with sorted keys,
/// whole floats without a fractional part.
impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => f.write_str(s),
            MetadataValue::Number(n) => fmt_number(n, f),
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            MetadataValue::Map(fields) => {
                f.write_str("map[")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                f.write_str("]")
            }
        }
    }
}

fn fmt_number(n: &serde_json::Number, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_i64() || n.is_u64() {
        return write!(f, "{}", n);
    }
    match n.as_f64() {
        Some(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e21 => write!(f, "{:.0}", x),
        Some(x) => write!(f, "{}", x),
        None => write!(f, "{}", n),
    }
}

/// Parse a metadata document from JSON text
pub fn metadata_from_json(json: &str) -> crate::Result<Metadata> {
    Ok(serde_json::from_str(json)?)
}
