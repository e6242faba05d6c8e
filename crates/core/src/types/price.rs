//! Type-safe price representation using decimal arithmetic.
//!
//! The backend is loose about how it returns prices: the same field may hold
//! `42.5`, `"42.50"` or something unparseable. [`Price::coerce`] accepts the
//! first two and rejects the rest, and [`lenient`] plugs that into serde so an
//! order with a garbage price still decodes (with the price absent).

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A ticket or order price in the storefront's single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Parse a price from text such as `"19.99"` or `"2.5e1"`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .ok()
            .map(Self)
    }

    /// Coerce a JSON value (number or numeric string) into a price.
    ///
    /// Returns `None` for anything else, including `null`.
    #[must_use]
    pub fn coerce(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => Self::parse(&n.to_string()),
            serde_json::Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    /// Format with two decimal places, e.g. `"$19.90"`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0.round_dp(2))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

/// Saturates at `Decimal::MAX`/`Decimal::MIN` instead of overflowing.
impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.fold(Decimal::ZERO, |total, p| total.saturating_add(p.0)))
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// The backend expects a JSON number, not the decimal string form.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::coerce(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid price: {value}")))
    }
}

/// Deserialize an optional price, mapping unparseable values to `None`.
///
/// Use with `#[serde(default, deserialize_with = "price::lenient")]`.
///
/// # Errors
///
/// Only fails if the input is not valid JSON at all.
pub fn lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Price>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(Price::coerce(&value))
}
