//! Booking an event into an order.

use tracing::{info, instrument};

use stagedoor_core::{NewOrder, UserId, ValidationError};

use crate::api::{ApiClient, GatewayError};
use crate::discovery::EventSummary;
use crate::session::SessionStore;

/// Build the order payload for booking `event`.
///
/// The order is priced at the low end of the event's price range.
#[must_use]
pub fn order_for_event(event: &EventSummary, user_id: Option<UserId>) -> NewOrder {
    NewOrder {
        title: event.name.clone(),
        total_price: event.price_range.min,
        event_date: event.date.clone(),
        venue: event.venue.clone(),
        location: event.city.clone(),
        event_id: Some(event.id.clone()),
        user_id,
    }
}

/// Books events for the signed-in user.
#[derive(Debug, Clone)]
pub struct BookingService {
    api: ApiClient,
    session: SessionStore,
}

impl BookingService {
    #[must_use]
    pub const fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    /// Create an order for `event` owned by the current user.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Validation(ValidationError::MissingUserId)`
    /// without sending anything when the session has no user id.
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn book(&self, event: &EventSummary) -> Result<serde_json::Value, GatewayError> {
        let user_id = self
            .session
            .current()
            .await?
            .and_then(|identity| identity.id)
            .ok_or(ValidationError::MissingUserId)?;

        let created = self
            .api
            .order_create(&order_for_event(event, Some(user_id)))
            .await?;
        info!(user_id = %user_id, "Event booked");
        Ok(created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::discovery::PriceRange;
    use rust_decimal::Decimal;
    use stagedoor_core::Price;

    fn event() -> EventSummary {
        EventSummary {
            id: "G5vYZ9".to_string(),
            name: "Fontaines D.C.".to_string(),
            url: None,
            image: None,
            date: Some("2025-09-12".to_string()),
            time: None,
            venue: Some("Roundhouse".to_string()),
            city: Some("London".to_string()),
            price_range: PriceRange {
                min: Price::new(Decimal::from(42)),
                max: Price::new(Decimal::from(60)),
                estimated: false,
            },
            ticket_limit: None,
        }
    }

    #[test]
    fn test_order_for_event() {
        let order = order_for_event(&event(), Some(UserId::new(7)));

        assert_eq!(order.title, "Fontaines D.C.");
        assert_eq!(order.total_price, Price::new(Decimal::from(42)));
        assert_eq!(order.event_date.as_deref(), Some("2025-09-12"));
        assert_eq!(order.venue.as_deref(), Some("Roundhouse"));
        assert_eq!(order.location.as_deref(), Some("London"));
        assert_eq!(order.event_id.as_deref(), Some("G5vYZ9"));
        assert_eq!(order.validate(), Ok(UserId::new(7)));
    }

    #[test]
    fn test_order_for_event_without_user_fails_validation() {
        let order = order_for_event(&event(), None);
        assert_eq!(order.validate(), Err(ValidationError::MissingUserId));
    }
}
