use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Divisor used when converting decimal prices to minor units.
pub const MINOR_UNIT_DIVISOR: i64 = 100;

/// Marketplace price representation: an integer amount over a divisor.
///
/// The canonical `Product::price` stays a plain decimal; conversion happens at
/// the adapter boundary only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub divisor: i64,
    pub currency_code: String,
}

impl Money {
    /// Converts a decimal price into minor units, rounding to the nearest unit.
    pub fn from_decimal(price: f64, currency_code: &str) -> Result<Self, ValidationError> {
        if !price.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "price" });
        }
        if price < 0.0 {
            return Err(ValidationError::NegativeValue { field: "price" });
        }

        Ok(Self {
            amount: (price * MINOR_UNIT_DIVISOR as f64).round() as i64,
            divisor: MINOR_UNIT_DIVISOR,
            currency_code: validate_currency_code(currency_code)?,
        })
    }

    /// Decimal value `amount / divisor`; a zero divisor yields zero.
    pub fn to_decimal(&self) -> f64 {
        decimal_from_parts(self.amount, self.divisor)
    }
}

pub(crate) fn decimal_from_parts(amount: i64, divisor: i64) -> f64 {
    if divisor == 0 {
        return 0.0;
    }
    amount as f64 / divisor as f64
}

/// Validate and normalize currency to uppercase 3-letter code.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}
