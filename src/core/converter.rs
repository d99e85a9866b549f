//! Type conversion directives (`as: Integer`) applied before validation.

use crate::core::{Config, SourceLine, Value};
use crate::error::ConfigError;
use bigdecimal::{BigDecimal, Signed, ToPrimitive, Zero};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};
use url::Url;

/// Type a value can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    /// Text
    String,
    /// `i64`
    Integer,
    /// `f64`
    Float,
    /// Arbitrary precision decimal
    Decimal,
    /// `true` / `false`
    Boolean,
    /// Parsed URL
    Url,
}

impl TargetType {
    /// Look up a target by name, ignoring case.
    ///
    /// Accepts `String`, `Integer` (`Int`, `Long`), `Float` (`Double`),
    /// `Decimal` (`BigDecimal`), `Boolean` (`Bool`) and `Url` (`Uri`).
    pub fn from_name(name: &str) -> Option<Self> {
        let target = match name.trim().to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "integer" | "int" | "long" => Self::Integer,
            "float" | "double" => Self::Float,
            "decimal" | "bigdecimal" => Self::Decimal,
            "boolean" | "bool" => Self::Boolean,
            "url" | "uri" => Self::Url,
            _ => return None,
        };
        Some(target)
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Decimal => "Decimal",
            Self::Boolean => "Boolean",
            Self::Url => "Url",
        }
    }

    /// Coerce `value` to this type.
    ///
    /// Strings bound for a numeric type are parsed as decimals first so no
    /// precision is lost on the way.
    pub fn coerce(self, value: &Value) -> Result<Value, String> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),
            (_, Value::List(_) | Value::Map(_) | Value::Range(_)) => {
                Err(format!("a {} cannot be converted", value.value_type()))
            }

            (Self::String, Value::String(_)) => Ok(value.clone()),
            (Self::String, other) => Ok(Value::String(other.to_string())),

            (Self::Integer, Value::Integer(_)) => Ok(value.clone()),
            (Self::Integer, _) => to_integer(&to_decimal(value)?),

            (Self::Float, Value::Float(_)) => Ok(value.clone()),
            (Self::Float, _) => to_float(&to_decimal(value)?),

            (Self::Decimal, Value::Decimal(_)) => Ok(value.clone()),
            (Self::Decimal, _) => to_decimal(value).map(Value::Decimal),

            (Self::Boolean, Value::Bool(_)) => Ok(value.clone()),
            (Self::Boolean, Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err("expected true or false".to_string()),
            },
            (Self::Boolean, other) => Err(format!("a {} cannot be converted", other.value_type())),

            (Self::Url, Value::Url(_)) => Ok(value.clone()),
            (Self::Url, Value::String(text)) => Url::parse(text.trim())
                .map(Value::Url)
                .map_err(|e| e.to_string()),
            (Self::Url, other) => Err(format!("a {} cannot be converted", other.value_type())),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn to_decimal(value: &Value) -> Result<BigDecimal, String> {
    match value {
        Value::String(text) => BigDecimal::from_str(text.trim()).map_err(|e| e.to_string()),
        Value::Bool(_) | Value::Url(_) => {
            Err(format!("a {} cannot be converted", value.value_type()))
        }
        other => match other.decimal_repr() {
            Some(parsed) => parsed.map_err(|e| e.to_string()),
            None => Err(format!("a {} cannot be converted", other.value_type())),
        },
    }
}

/// Digits of `i64::MAX`.
const MAX_INTEGER_MAGNITUDE: i64 = 19;
/// Digits of the largest finite `f64`.
const MAX_FLOAT_MAGNITUDE: i64 = 309;
/// Below this magnitude every `f64` rounds to zero.
const MIN_FLOAT_MAGNITUDE: i64 = -324;

/// Position of the decimal point relative to the leading digit: `n` means
/// `10^(n-1) <= |decimal| < 10^n`.
///
/// Cheap for any exponent, unlike conversions that expand the digits.
fn magnitude(decimal: &BigDecimal) -> i64 {
    let (_, scale) = decimal.as_bigint_and_exponent();
    let digits = i64::try_from(decimal.digits()).unwrap_or(i64::MAX);
    digits.saturating_sub(scale)
}

fn to_integer(decimal: &BigDecimal) -> Result<Value, String> {
    if decimal.is_zero() {
        return Ok(Value::Integer(0));
    }
    let magnitude = magnitude(decimal);
    if magnitude > MAX_INTEGER_MAGNITUDE {
        return Err("out of range for an integer".to_string());
    }
    if magnitude <= 0 || !decimal.is_integer() {
        return Err("not an integral number".to_string());
    }
    decimal
        .to_i64()
        .map(Value::Integer)
        .ok_or_else(|| "out of range for an integer".to_string())
}

fn to_float(decimal: &BigDecimal) -> Result<Value, String> {
    let magnitude = magnitude(decimal);
    if decimal.is_zero() || magnitude < MIN_FLOAT_MAGNITUDE {
        let zero = if decimal.is_negative() { -0.0 } else { 0.0 };
        return Ok(Value::Float(zero));
    }
    if magnitude > MAX_FLOAT_MAGNITUDE {
        return Err("out of range for a float".to_string());
    }
    decimal
        .to_f64()
        .filter(|f| f.is_finite())
        .map(Value::Float)
        .ok_or_else(|| "out of range for a float".to_string())
}

#[derive(Debug, Clone, PartialEq)]
struct Directive {
    target: TargetType,
    defined_at: SourceLine,
}

/// Key to target type registrations collected from specification files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeConverter {
    directives: BTreeMap<String, Directive>,
}

impl TypeConverter {
    /// Empty converter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversion of `key` to the type named `target`.
    ///
    /// A later registration for the same key replaces the earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConversion`] when `target` names no known
    /// type.
    pub fn register(
        &mut self,
        key: &str,
        target: &str,
        defined_at: SourceLine,
    ) -> Result<(), ConfigError> {
        let Some(target) = TargetType::from_name(target) else {
            return Err(ConfigError::InvalidConversion {
                key: key.to_string(),
                target: target.to_string(),
                defined_at,
            });
        };
        if let Some(previous) = self.directives.get(key) {
            debug!(key, previous = %previous.defined_at, "Replacing type conversion");
        }
        self.directives
            .insert(key.to_string(), Directive { target, defined_at });
        Ok(())
    }

    /// Target registered for `key`.
    pub fn target(&self, key: &str) -> Option<TargetType> {
        self.directives.get(key).map(|d| d.target)
    }

    /// Keys with a conversion directive, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.directives.keys().map(String::as_str)
    }

    /// Number of directives.
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    /// Whether no directive is registered.
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Fold another converter's directives into this one.
    pub fn merge(&mut self, other: TypeConverter) {
        self.directives.extend(other.directives);
    }

    /// Convert every registered key present in `config`, in place.
    ///
    /// A failed conversion leaves the original value untouched and appends a
    /// [`ConfigError::ConversionFailed`] to the config's errors.
    pub fn convert(&self, config: &mut Config) {
        let mut failures = Vec::new();
        for (key, directive) in &self.directives {
            let Some(value) = config.get_mut(key) else {
                continue;
            };
            match directive.target.coerce(value) {
                Ok(converted) => *value = converted,
                Err(reason) => {
                    warn!(key = %key, target = %directive.target, %reason, "Type conversion failed");
                    failures.push(ConfigError::ConversionFailed {
                        key: key.clone(),
                        value: value.clone(),
                        target: directive.target.name().to_string(),
                        reason,
                        defined_at: directive.defined_at.clone(),
                    });
                }
            }
        }
        config.extend_errors(failures);
    }
}
