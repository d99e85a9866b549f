//! Dynamically typed configuration values.

use bigdecimal::BigDecimal;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// A single configuration or expectation value.
///
/// Loaders produce the scalar, list and map variants; `Url` and `Decimal`
/// usually appear after type conversion, and `Range` only ever appears as a
/// constraint expectation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicitly unset.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Binary floating point number.
    Float(f64),
    /// Arbitrary precision decimal.
    Decimal(BigDecimal),
    /// Text.
    String(String),
    /// Ordered collection.
    List(Vec<Value>),
    /// Nested key/value structure.
    Map(BTreeMap<String, Value>),
    /// Parsed URL.
    Url(Url),
    /// A typed interval.
    Range(ValueRange),
}

/// Runtime type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    /// [`Value::Null`]
    Null,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Integer`]
    Integer,
    /// [`Value::Float`]
    Float,
    /// [`Value::Decimal`]
    Decimal,
    /// [`Value::String`]
    String,
    /// [`Value::List`]
    List,
    /// [`Value::Map`]
    Map,
    /// [`Value::Url`]
    Url,
    /// [`Value::Range`]
    Range,
}

impl ValueType {
    /// Human readable type name used in messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool => "Boolean",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Decimal => "Decimal",
            Self::String => "String",
            Self::List => "List",
            Self::Map => "Map",
            Self::Url => "Url",
            Self::Range => "Range",
        }
    }

    /// Whether values of this type are numbers.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::Decimal)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// Runtime type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Bool(_) => ValueType::Bool,
            Self::Integer(_) => ValueType::Integer,
            Self::Float(_) => ValueType::Float,
            Self::Decimal(_) => ValueType::Decimal,
            Self::String(_) => ValueType::String,
            Self::List(_) => ValueType::List,
            Self::Map(_) => ValueType::Map,
            Self::Url(_) => ValueType::Url,
            Self::Range(_) => ValueType::Range,
        }
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for strings that are empty or contain only whitespace.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::String(s) if s.trim().is_empty())
    }

    /// Borrow the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the elements, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the entries, if this is a map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Decimal form of a numeric value, obtained by parsing its string form.
    ///
    /// Returns `None` for non-numeric values and `Some(Err(..))` for numbers
    /// whose string form is not a decimal (NaN, infinities).
    pub fn decimal_repr(&self) -> Option<Result<BigDecimal, bigdecimal::ParseBigDecimalError>> {
        if !self.value_type().is_numeric() {
            return None;
        }
        Some(BigDecimal::from_str(&self.to_string()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Decimal(d) => write!(f, "{}", d),
            Self::String(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
            Self::Url(url) => f.write_str(url.as_str()),
            Self::Range(range) => write!(f, "{}", range),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Decimal(_) | Self::Url(_) | Self::Range(_) => {
                serializer.collect_str(self)
            }
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<BigDecimal> for Value {
    fn from(value: BigDecimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Url> for Value {
    fn from(value: Url) -> Self {
        Self::Url(value)
    }
}

impl From<ValueRange> for Value {
    fn from(value: ValueRange) -> Self {
        Self::Range(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => number_value(n.as_i64(), n.as_f64(), &n.to_string()),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Self::Null,
            serde_yaml::Value::Bool(b) => Self::Bool(b),
            serde_yaml::Value::Number(n) => number_value(n.as_i64(), n.as_f64(), &n.to_string()),
            serde_yaml::Value::String(s) => Self::String(s),
            serde_yaml::Value::Sequence(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_yaml::Value::Mapping(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (Value::from(k).to_string(), Value::from(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

/// Integers that fit i64 stay integers, everything else is kept as a decimal
/// when its text allows, falling back to f64.
fn number_value(as_i64: Option<i64>, as_f64: Option<f64>, text: &str) -> Value {
    if let Some(i) = as_i64 {
        return Value::Integer(i);
    }
    if !text.contains(['.', 'e', 'E'])
        && let Ok(d) = BigDecimal::from_str(text)
    {
        return Value::Decimal(d);
    }
    as_f64.map(Value::Float).unwrap_or(Value::Null)
}

/// One end of a [`ValueRange`].
#[derive(Debug, Clone, PartialEq)]
pub enum RangeBound {
    /// Integer bound.
    Integer(i64),
    /// Decimal bound.
    Decimal(BigDecimal),
    /// Lexicographically compared text bound.
    Text(String),
}

impl RangeBound {
    /// Name of the bound kind used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "Integer",
            Self::Decimal(_) => "Decimal",
            Self::Text(_) => "String",
        }
    }

    fn same_kind(&self, other: &RangeBound) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    fn compare(&self, other: &RangeBound) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Decimal(d) => write!(f, "{}", d),
            Self::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// A typed interval `from..to` (inclusive) or `from..<to` (exclusive end).
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRange {
    /// Lower bound, always inclusive.
    pub from: RangeBound,
    /// Upper bound.
    pub to: RangeBound,
    /// Whether `to` itself is excluded.
    pub exclusive_end: bool,
}

impl ValueRange {
    /// Inclusive integer range.
    pub fn integers(from: i64, to: i64) -> Self {
        Self {
            from: RangeBound::Integer(from),
            to: RangeBound::Integer(to),
            exclusive_end: false,
        }
    }

    /// Both bounds share a kind and `from` does not exceed `to`.
    pub fn is_well_formed(&self) -> bool {
        self.from.same_kind(&self.to)
            && matches!(self.from.compare(&self.to), Some(Ordering::Less | Ordering::Equal))
    }

    /// Bound kind, the type name values must match.
    pub fn bound_type(&self) -> &'static str {
        self.from.type_name()
    }

    /// Integer bounds, when this is an integer range.
    pub fn integer_bounds(&self) -> Option<(i64, i64)> {
        match (&self.from, &self.to) {
            (RangeBound::Integer(from), RangeBound::Integer(to)) => Some((*from, *to)),
            _ => None,
        }
    }

    /// Membership test for a bound of the same kind.
    ///
    /// Returns `None` when `value` is of a different kind than the range.
    pub fn contains(&self, value: &RangeBound) -> Option<bool> {
        let lower = value.compare(&self.from)?;
        let upper = value.compare(&self.to)?;
        let above = lower != Ordering::Less;
        let below = if self.exclusive_end {
            upper == Ordering::Less
        } else {
            upper != Ordering::Greater
        };
        Some(above && below)
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.exclusive_end { "..<" } else { ".." };
        write!(f, "{}{}{}", self.from, op, self.to)
    }
}
