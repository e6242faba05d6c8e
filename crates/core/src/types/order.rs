//! Order types.
//!
//! Orders are owned by the backend; the client only transports them. Decoding
//! is therefore lenient: every field is optional, ids may arrive as numbers or
//! numeric strings, and unknown fields are preserved in [`Order::extra`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::id::{OrderId, UserId};
use super::price::{self, Price};

/// Local validation failures, raised before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Orders must belong to a signed-in user with a backend id.
    #[error("a user id is required to create an order")]
    MissingUserId,

    /// Price is not a positive number.
    #[error("please enter a valid price (got {0:?})")]
    InvalidPrice(String),

    /// Title is blank.
    #[error("order title cannot be empty")]
    EmptyTitle,

    /// Email failed to parse.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] super::email::EmailError),
}

/// An order as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<OrderId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "price::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_price: Option<Price>,
    /// Older backends send the amount as `price`.
    #[serde(
        default,
        rename = "price",
        deserialize_with = "price::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub legacy_price: Option<Price>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, rename = "eventID")]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Fields this client does not model, kept for pass-through.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Order {
    /// The order amount, preferring `totalPrice` over the legacy `price`.
    #[must_use]
    pub fn price(&self) -> Option<Price> {
        self.total_price.or(self.legacy_price)
    }
}

/// Payload for creating an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub title: String,
    pub total_price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "eventID", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub user_id: Option<UserId>,
}

impl NewOrder {
    /// A bare order with just a title and price.
    #[must_use]
    pub fn new(title: impl Into<String>, total_price: Price, user_id: Option<UserId>) -> Self {
        Self {
            title: title.into(),
            total_price,
            event_date: None,
            venue: None,
            location: None,
            event_id: None,
            user_id,
        }
    }

    /// Check the payload before it goes on the wire.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingUserId` when no user id is set,
    /// `ValidationError::EmptyTitle` for a blank title and
    /// `ValidationError::InvalidPrice` when the price is not positive.
    pub fn validate(&self) -> Result<UserId, ValidationError> {
        let user_id = self.user_id.ok_or(ValidationError::MissingUserId)?;
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if !self.total_price.is_positive() {
            return Err(ValidationError::InvalidPrice(self.total_price.to_string()));
        }
        Ok(user_id)
    }
}

/// Parse a user-entered price, rejecting anything that is not a positive number.
///
/// # Errors
///
/// Returns `ValidationError::InvalidPrice` with the original input.
pub fn parse_price(input: &str) -> Result<Price, ValidationError> {
    Price::parse(input)
        .filter(Price::is_positive)
        .ok_or_else(|| ValidationError::InvalidPrice(input.to_owned()))
}

/// The `{ "orders": [...] }` envelope used by the list endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderList {
    pub orders: Vec<Order>,
}

impl OrderList {
    /// Decode a list response, treating a missing or malformed `orders` field as empty.
    ///
    /// Entries that are not objects are skipped.
    #[must_use]
    pub fn from_body(body: &serde_json::Value) -> Self {
        let entries = match body {
            serde_json::Value::Array(items) => Some(items),
            serde_json::Value::Object(map) => map.get("orders").and_then(|v| v.as_array()),
            _ => None,
        };

        let orders = entries
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value::<Order>(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Self { orders }
    }
}

/// Dashboard totals over a set of orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSummary {
    pub count: usize,
    pub revenue: Price,
    pub average: Price,
}

impl OrderSummary {
    /// Summarize orders; missing or unparseable prices count as zero.
    ///
    /// Revenue saturates at the largest representable amount.
    #[must_use]
    pub fn from_orders(orders: &[Order]) -> Self {
        let count = orders.len();
        let revenue: Price = orders.iter().map(|o| o.price().unwrap_or(Price::ZERO)).sum();
        let average = if count == 0 {
            Price::ZERO
        } else {
            Price::new(revenue.amount() / Decimal::from(count))
        };

        Self {
            count,
            revenue,
            average,
        }
    }
}

fn lenient_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<i64>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().map(T::from),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok().map(T::from),
        _ => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}
