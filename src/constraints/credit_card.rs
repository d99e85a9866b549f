//! Credit card numbers: brand prefix/length rules plus the Luhn checksum.

use super::{Constraint, ConstraintBase, Expectation, parse_selection};
use crate::core::{SourceLine, Value, ValueType};
use crate::error::ConfigError;
use std::fmt;

/// Card brands with known number formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardBrand {
    /// American Express
    Amex,
    /// Visa
    Visa,
    /// Mastercard
    Mastercard,
    /// Discover
    Discover,
    /// Diners Club
    Diners,
    /// V PAY
    VPay,
}

impl CardBrand {
    /// Every known brand.
    pub const ALL: [CardBrand; 6] = [
        Self::Amex,
        Self::Visa,
        Self::Mastercard,
        Self::Discover,
        Self::Diners,
        Self::VPay,
    ];

    /// Brand name as written in specifications.
    pub fn name(self) -> &'static str {
        match self {
            Self::Amex => "AMEX",
            Self::Visa => "VISA",
            Self::Mastercard => "MASTERCARD",
            Self::Discover => "DISCOVER",
            Self::Diners => "DINERS",
            Self::VPay => "VPAY",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|brand| brand.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Whether the digit string has this brand's prefix and length.
    fn matches_format(self, digits: &str) -> bool {
        let len = digits.len();
        let prefix = |n: usize| digits.get(..n).and_then(|p| p.parse::<u32>().ok());
        match self {
            Self::Amex => len == 15 && matches!(prefix(2), Some(34 | 37)),
            Self::Visa => (len == 13 || len == 16) && digits.starts_with('4'),
            Self::Mastercard => {
                len == 16
                    && (matches!(prefix(2), Some(51..=55))
                        || matches!(prefix(4), Some(2221..=2720)))
            }
            Self::Discover => {
                (digits.starts_with("6011") && (len == 16 || len == 17))
                    || (len == 16
                        && (matches!(prefix(3), Some(644..=649 | 622..=628))
                            || matches!(prefix(2), Some(65))))
            }
            Self::Diners => {
                (len == 14 && matches!(prefix(3), Some(300..=305)))
                    || (len == 14 && matches!(prefix(4), Some(3095)))
                    || (len == 14 && matches!(prefix(2), Some(36 | 38 | 39)))
            }
            Self::VPay => (13..=19).contains(&len) && digits.starts_with('4'),
        }
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Luhn mod-10 checksum over an all-digit string.
pub(crate) fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    !digits.is_empty() && sum % 10 == 0
}

/// `creditCard`: number must be valid for one of the allowed brands.
///
/// `true` (or an empty list) allows every brand; `false` turns the check off.
#[derive(Debug)]
pub struct CreditCardConstraint {
    base: ConstraintBase,
    brands: Expectation<Option<Vec<CardBrand>>>,
}

impl CreditCardConstraint {
    /// Create a credit card constraint.
    pub fn new(key: &str, expectation: Value, defined_at: SourceLine) -> Self {
        let brands = parse_selection(&expectation, &CardBrand::ALL, CardBrand::from_name).into();
        Self {
            base: ConstraintBase::new(key, expectation, defined_at),
            brands,
        }
    }
}

impl Constraint for CreditCardConstraint {
    fn name(&self) -> &'static str {
        "creditCard"
    }

    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn supports(&self, value_type: ValueType) -> bool {
        value_type == ValueType::String
    }

    fn is_valid_expectation(&self) -> bool {
        self.brands.is_valid()
    }

    fn do_validate(&self, value: &Value) -> Option<ConfigError> {
        let Some(brands) = self.brands.get()? else {
            return None;
        };
        let number = value.as_str()?;
        let valid = number.chars().all(|c| c.is_ascii_digit())
            && luhn_valid(number)
            && brands.iter().any(|brand| brand.matches_format(number));
        (!valid).then(|| self.violation(value))
    }
}
