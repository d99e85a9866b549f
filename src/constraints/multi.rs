//! Collection keys: one constraint applied to selected elements of a list.
//!
//! A collection key has the shape `base.[selector]` or
//! `base.[selector].property`, where the selector is `*`, an index `n`, or an
//! inclusive index range `from..to`. Each selected element (or the named
//! property of it) is checked by the wrapped constraint against a one-entry
//! config keyed by the collection key itself.

use super::{Constraint, ConstraintBase};
use crate::core::{Config, Value, ValueType};
use crate::error::{ConfigError, MultiConfigError};
use std::fmt;

/// Inclusive index selection; `end == None` means "to the last element".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSelector {
    /// First selected index.
    pub start: usize,
    /// Last selected index, if bounded.
    pub end: Option<usize>,
}

impl IndexSelector {
    /// Every element.
    pub const ALL: IndexSelector = IndexSelector {
        start: 0,
        end: None,
    };

    /// Whether `index` is selected.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && self.end.is_none_or(|end| index <= end)
    }

    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text == "*" {
            return Some(Self::ALL);
        }
        if let Some((from, to)) = text.split_once("..") {
            let start = from.trim().parse().ok()?;
            let end: usize = to.trim().parse().ok()?;
            return (start <= end).then_some(Self {
                start,
                end: Some(end),
            });
        }
        let index = text.parse().ok()?;
        Some(Self {
            start: index,
            end: Some(index),
        })
    }
}

impl fmt::Display for IndexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            None if self.start == 0 => f.write_str("*"),
            None => write!(f, "{}..", self.start),
            Some(end) if end == self.start => write!(f, "{}", end),
            Some(end) => write!(f, "{}..{}", self.start, end),
        }
    }
}

/// Parsed form of a collection key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionKey {
    /// Key of the list value.
    pub base: String,
    /// Which elements are checked.
    pub selector: IndexSelector,
    /// Property checked on each element; the element itself when absent.
    pub property: Option<String>,
}

impl CollectionKey {
    /// Whether `key` uses collection syntax at all.
    pub fn is_collection_key(key: &str) -> bool {
        key.contains(".[")
    }

    /// Parse `base.[selector]` or `base.[selector].property`.
    ///
    /// Returns `None` when the key is not well-formed collection syntax.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_validator::constraints::CollectionKey;
    ///
    /// let key = CollectionKey::parse("servers.[1..3].port").unwrap();
    /// assert_eq!(key.base, "servers");
    /// assert!(key.selector.contains(2));
    /// assert_eq!(key.property.as_deref(), Some("port"));
    /// ```
    pub fn parse(key: &str) -> Option<Self> {
        let (base, rest) = key.split_once(".[")?;
        let (selector, tail) = rest.split_once(']')?;
        if base.is_empty() {
            return None;
        }
        let property = match tail {
            "" => None,
            _ => {
                let property = tail.strip_prefix('.')?;
                if property.is_empty() || property.contains(['[', ']']) {
                    return None;
                }
                Some(property.to_string())
            }
        };
        Some(Self {
            base: base.to_string(),
            selector: IndexSelector::parse(selector)?,
            property,
        })
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.[{}]", self.base, self.selector)?;
        if let Some(property) = &self.property {
            write!(f, ".{}", property)?;
        }
        Ok(())
    }
}

/// Outcome of resolving a property on one element.
enum PropertyLookup {
    Found(Value),
    Unsupported,
    Blocked(String),
}

fn resolve_property(element: &Value, property: &str) -> PropertyLookup {
    let Value::Map(map) = element else {
        return PropertyLookup::Unsupported;
    };
    if let Some(value) = map.get(property) {
        return PropertyLookup::Found(value.clone());
    }
    let mut current = element;
    let mut path = String::new();
    for segment in property.split('.') {
        match current {
            Value::Map(map) => match map.get(segment) {
                Some(next) => current = next,
                None => return PropertyLookup::Found(Value::Null),
            },
            other => {
                return PropertyLookup::Blocked(format!(
                    "'{}' is a {} value, not a map",
                    path,
                    other.value_type()
                ));
            }
        }
        if !path.is_empty() {
            path.push('.');
        }
        path.push_str(segment);
    }
    PropertyLookup::Found(current.clone())
}

/// Applies a single-key constraint to every selected collection element.
#[derive(Debug)]
pub struct MultiKeyConstraint {
    key: CollectionKey,
    inner: Box<dyn Constraint>,
}

impl MultiKeyConstraint {
    /// Wrap a constraint whose key is the collection key as written.
    pub fn new(key: CollectionKey, inner: Box<dyn Constraint>) -> Self {
        Self { key, inner }
    }

    /// The parsed collection key.
    pub fn collection_key(&self) -> &CollectionKey {
        &self.key
    }

    fn element_error(&self, index: usize, element: &Value) -> Option<ConfigError> {
        let value = match &self.key.property {
            None => element.clone(),
            Some(property) => match resolve_property(element, property) {
                PropertyLookup::Found(value) => value,
                PropertyLookup::Unsupported => {
                    return Some(ConfigError::UnsupportedEntryProperty {
                        key: self.key().to_string(),
                        index,
                        property: property.clone(),
                        defined_at: self.defined_at().clone(),
                    });
                }
                PropertyLookup::Blocked(reason) => {
                    return Some(ConfigError::EntryPropertyAccess {
                        key: self.key().to_string(),
                        index,
                        property: property.clone(),
                        reason,
                        defined_at: self.defined_at().clone(),
                    });
                }
            },
        };
        self.inner.validate(&Config::single(self.key(), value))
    }
}

impl Constraint for MultiKeyConstraint {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn base(&self) -> &ConstraintBase {
        self.inner.base()
    }

    fn supports(&self, value_type: ValueType) -> bool {
        self.inner.supports(value_type)
    }

    fn is_valid_expectation(&self) -> bool {
        self.inner.is_valid_expectation()
    }

    fn do_validate(&self, value: &Value) -> Option<ConfigError> {
        self.inner.do_validate(value)
    }

    fn validate(&self, config: &Config) -> Option<ConfigError> {
        if !self.is_valid_expectation() {
            return self.inner.validate(&Config::new());
        }

        let Some(Value::List(elements)) = config.get(&self.key.base) else {
            return Some(ConfigError::NotACollection {
                key: self.key().to_string(),
                defined_at: self.defined_at().clone(),
            });
        };

        let errors: Vec<(usize, ConfigError)> = elements
            .iter()
            .enumerate()
            .filter(|(index, _)| self.key.selector.contains(*index))
            .filter_map(|(index, element)| {
                self.element_error(index, element).map(|error| (index, error))
            })
            .collect();

        if errors.is_empty() {
            return None;
        }
        Some(ConfigError::Multi(MultiConfigError {
            key: self.key().to_string(),
            defined_at: self.defined_at().clone(),
            errors,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::test_support::at;
    use crate::constraints::{ConstraintRegistry, PatternConstraint};
    use serde_json::json;

    fn matches_field(key: &str) -> MultiKeyConstraint {
        let collection_key = CollectionKey::parse(key).unwrap();
        let inner = PatternConstraint::new(key, Value::from("a\\..*"), at(3));
        MultiKeyConstraint::new(collection_key, Box::new(inner))
    }

    fn items_config() -> Config {
        Config::single(
            "items",
            Value::from(json!([{"field": "a.b"}, {"field": "bad"}, {"field": "a.c"}, {"field": "worse"}])),
        )
    }

    #[test]
    fn test_parse_selectors() {
        let all = CollectionKey::parse("items.[*].field").unwrap();
        assert_eq!(all.selector, IndexSelector::ALL);
        assert_eq!(all.property.as_deref(), Some("field"));

        let single = CollectionKey::parse("items.[2]").unwrap();
        assert_eq!(single.selector, IndexSelector { start: 2, end: Some(2) });
        assert_eq!(single.property, None);

        let range = CollectionKey::parse("a.b.[1..3].c.d").unwrap();
        assert_eq!(range.base, "a.b");
        assert_eq!(range.selector, IndexSelector { start: 1, end: Some(3) });
        assert_eq!(range.property.as_deref(), Some("c.d"));
        assert_eq!(range.to_string(), "a.b.[1..3].c.d");
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for key in [
            "items.[x]",
            "items.[3..1]",
            "items.[*",
            "items.[*]field",
            "items.[*].",
            ".[*]",
            "plain.key",
        ] {
            assert_eq!(CollectionKey::parse(key), None, "{}", key);
        }
        assert!(CollectionKey::is_collection_key("items.[x]"));
        assert!(!CollectionKey::is_collection_key("plain.key"));
    }

    #[test]
    fn test_grouped_element_errors() {
        let error = matches_field("items.[*].field").validate(&items_config());
        let Some(ConfigError::Multi(multi)) = error else {
            panic!("expected grouped error, got {:?}", error);
        };
        assert_eq!(multi.key, "items.[*].field");
        let indexes: Vec<_> = multi.errors.iter().map(|(i, _)| *i).collect();
        assert_eq!(indexes, vec![1, 3]);
        assert!(matches!(
            &multi.errors[0].1,
            ConfigError::Violation { key, value, .. }
                if key == "items.[*].field" && *value == Value::from("bad")
        ));
    }

    #[test]
    fn test_index_range_limits_checked_elements() {
        let error = matches_field("items.[0..2].field").validate(&items_config());
        let Some(ConfigError::Multi(multi)) = error else {
            panic!("expected grouped error");
        };
        assert_eq!(multi.errors.len(), 1);
        assert_eq!(multi.errors[0].0, 1);

        assert_eq!(matches_field("items.[2].field").validate(&items_config()), None);
    }

    #[test]
    fn test_star_equals_unrolled_indexes() {
        let config = items_config();
        let flatten = |error: Option<ConfigError>| -> Vec<(usize, Value)> {
            match error {
                Some(ConfigError::Multi(multi)) => multi
                    .errors
                    .into_iter()
                    .map(|(index, error)| match error {
                        ConfigError::Violation { value, .. } => (index, value),
                        other => panic!("unexpected {:?}", other),
                    })
                    .collect(),
                None => Vec::new(),
                Some(other) => panic!("unexpected {:?}", other),
            }
        };

        let star = flatten(matches_field("items.[*].field").validate(&config));
        let unrolled: Vec<_> = (0..4)
            .flat_map(|i| flatten(matches_field(&format!("items.[{}].field", i)).validate(&config)))
            .collect();
        assert_eq!(star, unrolled);
    }

    #[test]
    fn test_not_a_collection() {
        let constraint = matches_field("items.[*].field");
        assert!(matches!(
            constraint.validate(&Config::new()),
            Some(ConfigError::NotACollection { .. })
        ));
        assert!(matches!(
            constraint.validate(&Config::single("items", Value::from("scalar"))),
            Some(ConfigError::NotACollection { .. })
        ));
    }

    #[test]
    fn test_property_resolution_failures() {
        let config = Config::single(
            "items",
            Value::from(json!(["scalar", {"field": {"deep": 1}}, {"other": 1}, {"field": "text"}])),
        );
        let collection_key = CollectionKey::parse("items.[*].field.deep").unwrap();
        let inner = ConstraintRegistry::with_builtins()
            .by_name("max")
            .unwrap()
            .create("items.[*].field.deep", Value::Integer(0), at(1));
        let constraint = MultiKeyConstraint::new(collection_key, inner);

        let Some(ConfigError::Multi(multi)) = constraint.validate(&config) else {
            panic!("expected grouped error");
        };
        assert_eq!(multi.errors.len(), 3);
        assert!(matches!(multi.errors[0], (0, ConfigError::UnsupportedEntryProperty { .. })));
        assert!(matches!(multi.errors[1], (1, ConfigError::Violation { .. })));
        // index 2 resolves to null and is skipped
        assert!(matches!(
            &multi.errors[2],
            (3, ConfigError::EntryPropertyAccess { reason, .. }) if reason.contains("String")
        ));
    }

    #[test]
    fn test_flat_property_key_wins_over_nesting() {
        let config = Config::single("items", Value::from(json!([{"a.b": "x", "a": {"b": "a.ok"}}])));
        let constraint = matches_field("items.[*].a.b");
        assert!(matches!(constraint.validate(&config), Some(ConfigError::Multi(_))));
    }

    #[test]
    fn test_invalid_expectation_reported_once() {
        let collection_key = CollectionKey::parse("items.[*].field").unwrap();
        let inner = PatternConstraint::new("items.[*].field", Value::Integer(1), at(1));
        let constraint = MultiKeyConstraint::new(collection_key, Box::new(inner));
        assert!(matches!(
            constraint.validate(&items_config()),
            Some(ConfigError::InvalidExpectation { .. })
        ));
    }

    #[test]
    fn test_elements_without_property() {
        let collection_key = CollectionKey::parse("ports.[*]").unwrap();
        let inner = ConstraintRegistry::with_builtins()
            .by_name("max")
            .unwrap()
            .create("ports.[*]", Value::Integer(1024), at(1));
        let constraint = MultiKeyConstraint::new(collection_key, inner);
        let config = Config::single("ports", Value::from(json!([80, 8080, 443])));
        let Some(ConfigError::Multi(multi)) = constraint.validate(&config) else {
            panic!("expected grouped error");
        };
        assert_eq!(multi.errors.len(), 1);
        assert_eq!(multi.errors[0].0, 1);
    }
}
