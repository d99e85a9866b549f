//! URLs.

use super::domain::DomainRules;
use super::{Constraint, ConstraintBase, Expectation};
use crate::core::{SourceLine, Value, ValueType};
use crate::error::ConfigError;
use url::{Host, Url};

const DEFAULT_SCHEMES: [&str; 3] = ["http", "https", "ftp"];

/// Parsed `url` expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlRules {
    /// Host acceptance.
    pub domain: DomainRules,
    /// Allowed schemes, lower-case.
    pub schemes: Vec<String>,
}

impl UrlRules {
    fn parse(expectation: &Value) -> Option<Option<Self>> {
        let Some((domain, extras)) = DomainRules::parse(expectation, &["schemes"])? else {
            return Some(None);
        };
        let schemes = match extras.get("schemes") {
            None => DEFAULT_SCHEMES.iter().map(|s| s.to_string()).collect(),
            Some(Value::List(items)) if !items.is_empty() => items
                .iter()
                .map(|item| item.as_str().map(|s| s.trim().to_ascii_lowercase()))
                .collect::<Option<Vec<_>>>()?,
            Some(_) => return None,
        };
        Some(Some(Self { domain, schemes }))
    }

    fn accepts(&self, text: &str) -> bool {
        if text.trim() != text {
            return false;
        }
        let Ok(url) = Url::parse(text) else {
            return false;
        };
        if !self.schemes.iter().any(|s| s == url.scheme()) {
            return false;
        }
        match url.host() {
            Some(Host::Domain(domain)) => self.domain.is_valid_host(domain),
            Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
            None => false,
        }
    }
}

/// `url`: `true`, `{}` or `{local, customTLDs, schemes}`.
///
/// Values that are already [`Value::Url`] are accepted as they are.
#[derive(Debug)]
pub struct UrlConstraint {
    base: ConstraintBase,
    rules: Expectation<Option<UrlRules>>,
}

impl UrlConstraint {
    /// Create a URL constraint.
    pub fn new(key: &str, expectation: Value, defined_at: SourceLine) -> Self {
        let rules = UrlRules::parse(&expectation).into();
        Self {
            base: ConstraintBase::new(key, expectation, defined_at),
            rules,
        }
    }
}

impl Constraint for UrlConstraint {
    fn name(&self) -> &'static str {
        "url"
    }

    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn supports(&self, value_type: ValueType) -> bool {
        matches!(value_type, ValueType::String | ValueType::Url)
    }

    fn is_valid_expectation(&self) -> bool {
        self.rules.is_valid()
    }

    fn do_validate(&self, value: &Value) -> Option<ConfigError> {
        let Some(rules) = self.rules.get()? else {
            return None;
        };
        match value {
            Value::String(text) if !rules.accepts(text) => Some(self.violation(value)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::test_support::*;
    use serde_json::json;

    fn url(expectation: impl Into<Value>) -> UrlConstraint {
        UrlConstraint::new("endpoint", expectation.into(), at(1))
    }

    #[test]
    fn test_default_rules() {
        let constraint = url(true);
        assert_eq!(check(&constraint, "https://example.com/path?q=1"), None);
        assert_eq!(check(&constraint, "ftp://files.example.org"), None);
        assert_eq!(check(&constraint, "http://10.1.2.3:8080/"), None);
        assert!(is_violation(&check(&constraint, "mailto:user@example.com")));
        assert!(is_violation(&check(&constraint, "http://localhost:8080")));
        assert!(is_violation(&check(&constraint, "not a url")));
        assert!(is_violation(&check(&constraint, "http://service.internal")));
    }

    #[test]
    fn test_local_and_custom_tlds() {
        let constraint = url(json!({"local": true, "customTLDs": ["internal"]}));
        assert_eq!(check(&constraint, "http://localhost:8080"), None);
        assert_eq!(check(&constraint, "http://service.internal/health"), None);
    }

    #[test]
    fn test_schemes() {
        let constraint = url(json!({"schemes": ["jdbc", "HTTPS"]}));
        assert_eq!(check(&constraint, "https://example.com"), None);
        assert!(is_violation(&check(&constraint, "http://example.com")));
    }

    #[test]
    fn test_parsed_url_bypasses_string_checks() {
        let parsed = Url::parse("http://localhost").unwrap();
        assert_eq!(check(&url(true), Value::Url(parsed)), None);
    }

    #[test]
    fn test_invalid_expectation() {
        assert!(!url(json!({"schemes": []})).is_valid_expectation());
        assert!(!url(json!({"schemes": "http"})).is_valid_expectation());
        assert!(!url(json!({"unknown": true})).is_valid_expectation());
        assert!(!url(1).is_valid_expectation());
    }
}
