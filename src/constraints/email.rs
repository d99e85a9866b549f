//! Email addresses.

use super::domain::DomainRules;
use super::{Constraint, ConstraintBase, Expectation};
use crate::core::{SourceLine, Value, ValueType};
use crate::error::ConfigError;
use std::net::{Ipv4Addr, Ipv6Addr};

const LOCAL_PART_SPECIALS: &str = "!#$%&'*+/=?^_`{|}~.-";

/// `email`: `true`, `{}` or `{local: bool, customTLDs: [...]}`.
#[derive(Debug)]
pub struct EmailConstraint {
    base: ConstraintBase,
    rules: Expectation<Option<DomainRules>>,
}

impl EmailConstraint {
    /// Create an email constraint.
    pub fn new(key: &str, expectation: Value, defined_at: SourceLine) -> Self {
        let rules = DomainRules::parse(&expectation, &[])
            .map(|parsed| parsed.map(|(rules, _)| rules))
            .into();
        Self {
            base: ConstraintBase::new(key, expectation, defined_at),
            rules,
        }
    }
}

fn is_valid_local_part(local: &str) -> bool {
    if local.is_empty() || local.len() > 64 {
        return false;
    }
    if local.len() >= 2 && local.starts_with('"') && local.ends_with('"') {
        let inner = &local[1..local.len() - 1];
        return !inner.contains(['"', '\\']) && inner.chars().all(|c| !c.is_control());
    }
    !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || LOCAL_PART_SPECIALS.contains(c))
}

fn is_valid_address(address: &str, rules: &DomainRules) -> bool {
    if address.ends_with('.') {
        return false;
    }
    let Some((local, domain)) = address.rsplit_once('@') else {
        return false;
    };
    if !is_valid_local_part(local) {
        return false;
    }
    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        return match literal.strip_prefix("IPv6:") {
            Some(v6) => v6.parse::<Ipv6Addr>().is_ok(),
            None => literal.parse::<Ipv4Addr>().is_ok(),
        };
    }
    rules.is_valid_host(domain)
}

impl Constraint for EmailConstraint {
    fn name(&self) -> &'static str {
        "email"
    }

    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn supports(&self, value_type: ValueType) -> bool {
        value_type == ValueType::String
    }

    fn is_valid_expectation(&self) -> bool {
        self.rules.is_valid()
    }

    fn do_validate(&self, value: &Value) -> Option<ConfigError> {
        let Some(rules) = self.rules.get()? else {
            return None;
        };
        let address = value.as_str()?;
        (!is_valid_address(address, rules)).then(|| self.violation(value))
    }
}
