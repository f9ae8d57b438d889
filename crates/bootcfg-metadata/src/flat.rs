//! Flat `KEY=value` metadata
//!
//! One line per top-level field with the key upper-cased. Nested values use
//! their scalar-sequence text form (`[a b]`, `map[k:v]`). Line order follows
//! the document's key order and is not part of the contract.
//!
//! A value containing a newline (a PEM block, say) would read back as
//! extra `KEY=value` lines, so such a document is refused as a whole.
//! Templates are the place for multi-line values.

use crate::error::{MetadataError, Result};
use bootcfg_model::Metadata;

/// Metadata flattened to upper-cased key/value lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatMetadata {
    lines: Vec<(String, String)>,
}

impl FlatMetadata {
    /// Flatten a metadata document
    ///
    /// Fails if two keys upper-case to the same name or a value spans
    /// several lines.
    pub fn from_document(doc: &Metadata) -> Result<Self> {
        let mut flat = FlatMetadata::default();
        for (key, value) in doc {
            flat.push(key, value.to_string())?;
        }
        Ok(flat)
    }

    /// Append a request-supplied identifier (e.g. the `uuid` query value).
    ///
    /// If the document already carries the key with the same value it is
    /// kept once; a different value is a collision.
    pub fn with_identifier(mut self, key: &str, value: &str) -> Result<Self> {
        let upper = key.to_uppercase();
        match self.get(&upper) {
            Some(existing) if existing == value => Ok(self),
            Some(_) => Err(MetadataError::KeyCollision(upper)),
            None => {
                self.push(key, value.to_string())?;
                Ok(self)
            }
        }
    }

    /// Look up a line by its upper-cased key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render as newline terminated `KEY=value` lines
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.lines {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    fn push(&mut self, key: &str, value: String) -> Result<()> {
        let upper = key.to_uppercase();
        if upper.is_empty() || upper.contains(['=', '\n', '\r']) {
            return Err(MetadataError::InvalidValue {
                key: key.to_string(),
                reason: "key cannot be written as a line prefix".to_string(),
            });
        }
        if value.contains(['\n', '\r']) {
            return Err(MetadataError::InvalidValue {
                key: upper,
                reason: "value spans multiple lines".to_string(),
            });
        }
        if self.get(&upper).is_some() {
            return Err(MetadataError::KeyCollision(upper));
        }
        self.lines.push((upper, value));
        Ok(())
    }
}
