//! Hardware (MAC) addresses

use crate::{ModelError, Result};
use std::fmt;
use std::str::FromStr;

/// A 48-bit IEEE 802 MAC address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Parse a MAC address in `aa:bb:cc:dd:ee:ff`, `aa-bb-cc-dd-ee-ff` or
    /// `aabb.ccdd.eeff` form.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || ModelError::InvalidMacAddress(s.to_string());

        let groups: Vec<&str> = if s.contains(':') {
            s.split(':').collect()
        } else if s.contains('-') {
            s.split('-').collect()
        } else if s.contains('.') {
            // Dotted form is three groups of four hex digits
            let dotted: Vec<&str> = s.split('.').collect();
            if dotted.len() != 3 || dotted.iter().any(|g| g.len() != 4 || !g.is_ascii()) {
                return Err(invalid());
            }
            dotted
                .into_iter()
                .flat_map(|g: &str| [&g[..2], &g[2..]])
                .collect()
        } else {
            return Err(invalid());
        };

        if groups.len() != 6 {
            return Err(invalid());
        }

        let mut octets = [0u8; 6];
        for (octet, group) in octets.iter_mut().zip(&groups) {
            if group.len() != 2 || !group.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(group, 16).map_err(|_| invalid())?;
        }

        Ok(Self(octets))
    }
}

impl FromStr for MacAddr {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        MacAddr::parse(s)
    }
}

/// Lower-case, colon separated form used as the `mac` label value
impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}
