//! IP address literals.

use super::{Constraint, ConstraintBase, Expectation, parse_selection};
use crate::core::{SourceLine, Value, ValueType};
use crate::error::ConfigError;
use std::net::{Ipv4Addr, Ipv6Addr};

/// IP protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    /// Dotted quad.
    V4,
    /// Colon-separated hex groups.
    V6,
}

impl IpVersion {
    /// Both versions.
    pub const ALL: [IpVersion; 2] = [Self::V4, Self::V6];

    /// Case-insensitive lookup of `IPv4` / `IPv6`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ipv4" => Some(Self::V4),
            "ipv6" => Some(Self::V6),
            _ => None,
        }
    }

    fn parses(self, text: &str) -> bool {
        match self {
            Self::V4 => text.parse::<Ipv4Addr>().is_ok(),
            Self::V6 => text.parse::<Ipv6Addr>().is_ok(),
        }
    }
}

/// `inetAddress`: value must be an address of an allowed version.
#[derive(Debug)]
pub struct InetAddressConstraint {
    base: ConstraintBase,
    versions: Expectation<Option<Vec<IpVersion>>>,
}

impl InetAddressConstraint {
    /// Create an IP address constraint.
    pub fn new(key: &str, expectation: Value, defined_at: SourceLine) -> Self {
        let versions = parse_selection(&expectation, &IpVersion::ALL, IpVersion::from_name).into();
        Self {
            base: ConstraintBase::new(key, expectation, defined_at),
            versions,
        }
    }
}

impl Constraint for InetAddressConstraint {
    fn name(&self) -> &'static str {
        "inetAddress"
    }

    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn supports(&self, value_type: ValueType) -> bool {
        value_type == ValueType::String
    }

    fn is_valid_expectation(&self) -> bool {
        self.versions.is_valid()
    }

    fn do_validate(&self, value: &Value) -> Option<ConfigError> {
        let Some(versions) = self.versions.get()? else {
            return None;
        };
        let text = value.as_str()?;
        (!versions.iter().any(|v| v.parses(text))).then(|| self.violation(value))
    }
}
