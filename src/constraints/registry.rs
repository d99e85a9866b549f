//! Lookup of constraint kinds by the name used in specification files.

use super::{
    Constraint, CreditCardConstraint, EmailConstraint, InListConstraint, InetAddressConstraint,
    NumericComparison, NumericConstraint, PatternConstraint, RangeConstraint, SizeConstraint,
    TypeConstraint, UrlConstraint,
};
use crate::core::{SourceLine, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Creates constraints of one kind.
pub trait ConstraintFactory: Send + Sync {
    /// Name the kind is declared under.
    fn name(&self) -> &'static str;

    /// Build a constraint for `key`.
    fn create(&self, key: &str, expectation: Value, defined_at: SourceLine) -> Box<dyn Constraint>;
}

type Create = fn(&str, Value, SourceLine) -> Box<dyn Constraint>;

/// Factory backed by a plain function.
#[derive(Clone, Copy)]
pub struct FnFactory {
    name: &'static str,
    create: Create,
}

impl FnFactory {
    /// Pair a name with its constructor.
    pub const fn new(name: &'static str, create: Create) -> Self {
        Self { name, create }
    }
}

impl fmt::Debug for FnFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory").field("name", &self.name).finish()
    }
}

impl ConstraintFactory for FnFactory {
    fn name(&self) -> &'static str {
        self.name
    }

    fn create(&self, key: &str, expectation: Value, defined_at: SourceLine) -> Box<dyn Constraint> {
        (self.create)(key, expectation, defined_at)
    }
}

/// No factory is registered under the requested name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown constraint '{0}'")]
pub struct UnknownConstraint(pub String);

macro_rules! boxed {
    ($ty:ty) => {
        |key, expectation, defined_at| Box::new(<$ty>::new(key, expectation, defined_at))
    };
}

macro_rules! numeric {
    ($comparison:expr) => {
        |key, expectation, defined_at| {
            Box::new(NumericConstraint::new($comparison, key, expectation, defined_at))
        }
    };
}

const BUILTINS: [FnFactory; 13] = [
    FnFactory::new("size", boxed!(SizeConstraint)),
    FnFactory::new("range", boxed!(RangeConstraint)),
    FnFactory::new("min", numeric!(NumericComparison::AtLeast)),
    FnFactory::new("max", numeric!(NumericComparison::AtMost)),
    FnFactory::new("greaterThan", numeric!(NumericComparison::GreaterThan)),
    FnFactory::new("lessThan", numeric!(NumericComparison::LessThan)),
    FnFactory::new("matches", boxed!(PatternConstraint)),
    FnFactory::new("creditCard", boxed!(CreditCardConstraint)),
    FnFactory::new("inetAddress", boxed!(InetAddressConstraint)),
    FnFactory::new("email", boxed!(EmailConstraint)),
    FnFactory::new("url", boxed!(UrlConstraint)),
    FnFactory::new("inList", boxed!(InListConstraint)),
    FnFactory::new("type", boxed!(TypeConstraint)),
];

/// Name-indexed set of constraint factories.
///
/// Built once and read-only afterwards, so one registry can be shared by
/// every specification parser.
pub struct ConstraintRegistry {
    factories: BTreeMap<&'static str, Box<dyn ConstraintFactory>>,
}

impl ConstraintRegistry {
    /// Registry with the given factories.
    ///
    /// # Panics
    ///
    /// Panics if two factories share a name.
    pub fn new(factories: impl IntoIterator<Item = Box<dyn ConstraintFactory>>) -> Self {
        let mut by_name = BTreeMap::new();
        for factory in factories {
            let name = factory.name();
            if by_name.insert(name, factory).is_some() {
                panic!("duplicate constraint factory '{}'", name);
            }
        }
        Self { factories: by_name }
    }

    /// Registry with every built-in kind.
    pub fn with_builtins() -> Self {
        Self::new(
            BUILTINS
                .iter()
                .map(|factory| Box::new(*factory) as Box<dyn ConstraintFactory>),
        )
    }

    /// Built-ins plus `extra` factories.
    ///
    /// # Panics
    ///
    /// Panics if an extra factory reuses a registered name.
    pub fn with_builtins_and(
        extra: impl IntoIterator<Item = Box<dyn ConstraintFactory>>,
    ) -> Self {
        Self::new(
            BUILTINS
                .iter()
                .map(|factory| Box::new(*factory) as Box<dyn ConstraintFactory>)
                .chain(extra),
        )
    }

    /// Factory registered under `name`.
    pub fn by_name(&self, name: &str) -> Result<&dyn ConstraintFactory, UnknownConstraint> {
        self.factories
            .get(name)
            .map(|factory| factory.as_ref())
            .ok_or_else(|| UnknownConstraint(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

impl Default for ConstraintRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ConstraintRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::test_support::at;

    #[test]
    fn test_builtin_names() {
        let registry = ConstraintRegistry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names.len(), 13);
        for name in ["size", "range", "min", "max", "greaterThan", "lessThan", "matches"] {
            assert!(names.contains(&name), "{}", name);
        }
    }

    #[test]
    fn test_created_constraint_keeps_declaration() {
        let registry = ConstraintRegistry::with_builtins();
        for name in registry.names() {
            let constraint = registry
                .by_name(name)
                .unwrap()
                .create("server.port", Value::Integer(1), at(7));
            assert_eq!(constraint.name(), name);
            assert_eq!(constraint.key(), "server.port");
            assert_eq!(constraint.defined_at().line(), 7);
        }
    }

    #[test]
    fn test_unknown_name() {
        let registry = ConstraintRegistry::with_builtins();
        let error = registry.by_name("isPrime").err().unwrap();
        assert_eq!(error, UnknownConstraint("isPrime".to_string()));
        assert_eq!(error.to_string(), "unknown constraint 'isPrime'");
        assert!(registry.by_name("Size").is_err());
    }

    #[test]
    fn test_custom_factory() {
        fn non_empty(key: &str, _: Value, defined_at: SourceLine) -> Box<dyn Constraint> {
            Box::new(SizeConstraint::new(
                key,
                Value::Range(crate::core::ValueRange::integers(1, i64::MAX)),
                defined_at,
            ))
        }

        let registry = ConstraintRegistry::with_builtins_and([
            Box::new(FnFactory::new("notEmpty", non_empty)) as Box<dyn ConstraintFactory>,
        ]);
        let constraint = registry
            .by_name("notEmpty")
            .unwrap()
            .create("name", Value::Bool(true), at(1));
        assert_eq!(constraint.name(), "size");
        assert!(constraint.validate(&crate::core::Config::single("name", Value::from("x"))).is_none());
        assert!(registry.by_name("size").is_ok());
    }

    #[test]
    #[should_panic(expected = "duplicate constraint factory 'size'")]
    fn test_duplicate_names_panic() {
        ConstraintRegistry::with_builtins_and([
            Box::new(FnFactory::new("size", |key, expectation, defined_at| {
                Box::new(SizeConstraint::new(key, expectation, defined_at)) as Box<dyn Constraint>
            })) as Box<dyn ConstraintFactory>,
        ]);
    }
}
