//! Order listing, creation, deletion and dashboard totals.

use tracing::{debug, instrument};

use stagedoor_core::{NewOrder, Order, OrderId, OrderList, OrderSummary};

use crate::api::{ApiClient, GatewayError};
use crate::error::add_breadcrumb;
use crate::session::SessionStore;

/// Order service.
#[derive(Debug, Clone)]
pub struct OrderService {
    api: ApiClient,
    session: SessionStore,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub const fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    /// Orders visible to the current session.
    ///
    /// Signed-in users with a backend id get their own orders; everyone else
    /// gets the full list.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Session` before the session is initialized, or
    /// a transport/server error.
    #[instrument(skip(self))]
    pub async fn list_for_session(&self) -> Result<Vec<Order>, GatewayError> {
        let user_id = self.session.current().await?.and_then(|identity| identity.id);
        let body = match user_id {
            Some(user_id) => self.api.order_get_by_user(user_id).await?,
            None => self.api.order_get_all().await?,
        };

        let orders = OrderList::from_body(&body).orders;
        debug!(count = orders.len(), by_user = user_id.is_some(), "Orders listed");
        Ok(orders)
    }

    /// Every order.
    ///
    /// # Errors
    ///
    /// Returns a transport/server error.
    pub async fn list_all(&self) -> Result<Vec<Order>, GatewayError> {
        let body = self.api.order_get_all().await?;
        Ok(OrderList::from_body(&body).orders)
    }

    /// Count, revenue and average over every order.
    ///
    /// # Errors
    ///
    /// Returns a transport/server error.
    pub async fn summary(&self) -> Result<OrderSummary, GatewayError> {
        Ok(OrderSummary::from_orders(&self.list_all().await?))
    }

    /// Create an order, filling in the session's user id when none is set.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Validation` without sending anything when the
    /// order is invalid (including no user id), or a transport/server error.
    #[instrument(skip(self, order), fields(title = %order.title))]
    pub async fn create(&self, mut order: NewOrder) -> Result<serde_json::Value, GatewayError> {
        if order.user_id.is_none() {
            order.user_id = self.session.current().await?.and_then(|identity| identity.id);
        }

        let created = self.api.order_create(&order).await?;
        add_breadcrumb("orders", "Created order", Some(&[("title", order.title.as_str())]));
        Ok(created)
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::order_delete`].
    pub async fn delete(&self, order_id: OrderId) -> Result<serde_json::Value, GatewayError> {
        let deleted = self.api.order_delete(order_id).await?;
        add_breadcrumb(
            "orders",
            "Deleted order",
            Some(&[("order_id", order_id.to_string().as_str())]),
        );
        Ok(deleted)
    }
}
